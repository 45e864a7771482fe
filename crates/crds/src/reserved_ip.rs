//! ReservedIP CRD
//!
//! Cluster-wide address ranges withheld from every pool. Reserved ranges
//! are never subtracted from a pool's declared membership; they are
//! excluded from the available set at allocation time only.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ip_pool::IPVersion;

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(group = "ipam.podnet.io", version = "v1alpha1", kind = "ReservedIP")]
#[serde(rename_all = "camelCase")]
pub struct ReservedIPSpec {
    /// IP family of every range below (4 or 6)
    pub ip_version: IPVersion,

    /// Reserved ranges: inclusive "a-b" ranges, single IPs, or CIDRs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ips: Vec<String>,
}
