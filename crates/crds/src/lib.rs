//! IPAM CRD Definitions
//!
//! Kubernetes Custom Resource Definitions for the IP allocation engine:
//! - IPPool: declarative IP range collections and their allocation ledger
//! - ReservedIP: cluster-wide ranges withheld from every pool
//!
//! Shared wire types handed to the networking client live here as well.

pub mod ip_config;
pub mod ip_pool;
pub mod reserved_ip;

// Re-exports
pub use ip_config::*;
pub use ip_pool::*;
pub use reserved_ip::*;
