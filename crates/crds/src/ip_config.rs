//! Allocation results handed back to the networking client.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ip_pool::IPVersion;

/// Per-NIC address assignment produced by a successful allocation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IPConfig {
    /// Canonical IP joined with the pool subnet's prefix length ("ip/len")
    pub address: String,

    pub nic: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,

    /// Name of the pool the address was drawn from
    pub ip_pool: String,

    #[serde(default)]
    pub vlan: i64,

    pub version: IPVersion,
}

/// Release-request pair: an address and the container expected to own it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IPAndContainerID {
    pub ip: String,

    pub container_id: String,
}
