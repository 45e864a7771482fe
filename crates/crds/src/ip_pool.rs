//! IPPool CRD
//!
//! A cluster-scoped collection of IP ranges for container networking.
//! The spec declares membership; the status carries the authoritative
//! allocation ledger, mutated only through conditional writes.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// IP family selector carried by pools and reserved lists. Valid values
/// are [`IPV4`] and [`IPV6`].
pub type IPVersion = i64;

pub const IPV4: IPVersion = 4;
pub const IPV6: IPVersion = 6;

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "ipam.podnet.io",
    version = "v1alpha1",
    kind = "IPPool",
    status = "IPPoolStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct IPPoolSpec {
    /// IP family of every range in this pool (4 or 6); immutable after creation
    pub ip_version: IPVersion,

    /// CIDR the pool lives in; its prefix length is advertised to clients
    pub subnet: String,

    /// Declared membership: inclusive "a-b" ranges, single IPs, or CIDRs
    pub ips: Vec<String>,

    /// Ranges subtracted from `ips` before any allocation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_ips: Vec<String>,

    /// Gateway advertised to clients; never subtracted from the pool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,

    /// L2 domain tag used for cross-pool compatibility checks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlan: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct IPPoolStatus {
    /// Authoritative ledger: canonical IP text to the owning allocation
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub allocated_ips: BTreeMap<String, IPAllocation>,

    /// Always equal to the number of ledger entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocated_ip_count: Option<i64>,

    /// Desired pool size published by an external autoscaler; informational
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_desired_ip_count: Option<i64>,
}

/// Persisted binding of one IP to the container that owns it.
///
/// Immutable for the life of the binding, except that re-binding a
/// stable-identity pod rewrites `container_id`, `nic` and `node`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IPAllocation {
    pub container_id: String,

    pub nic: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub node: String,

    pub namespace: String,

    pub pod: String,

    /// Kind of the highest-level controller owning the pod
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub owner_controller_kind: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub owner_controller_name: String,
}
