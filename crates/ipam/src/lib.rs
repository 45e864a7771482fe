//! Core IP-address allocation engine for container networking.
//!
//! Pools are declarative [`crds::IPPool`] objects; the engine computes each
//! pool's available set, draws addresses at random, and records bindings in
//! the pool's status ledger through conditional writes. The backing store
//! linearizes those writes, so the engine holds no in-process allocation
//! state: concurrent writers race, losers refetch and retry.
//!
//! Calls honor cancellation the usual way: dropping a call future aborts it
//! at the next suspension point, and no allocation becomes visible unless
//! its conditional write succeeded.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use ipam::{IPPoolManager, IPPoolManagerConfig, PodTopology};
//! use pool_store::KubePoolStore;
//!
//! # async fn example(pods: Arc<dyn PodTopology>) -> Result<(), Box<dyn std::error::Error>> {
//! let client = kube::Client::try_default().await?;
//! let store = Arc::new(KubePoolStore::new(client));
//!
//! let manager = IPPoolManager::new(
//!     IPPoolManagerConfig::default(),
//!     store.clone(),
//!     store,
//!     pods,
//! );
//!
//! let pool = manager.get_ip_pool_by_name("default-v4").await?;
//! println!("{} ranges declared", pool.spec.ips.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod ip;
pub mod limiter;
pub mod manager;
pub mod pods;

#[cfg(test)]
mod test_utils;

pub use config::IPPoolManagerConfig;
pub use error::IpamError;
pub use limiter::{FreeIPsLimiter, LimiterConfig, LimiterError};
pub use manager::IPPoolManager;
pub use pods::{PodTopology, PodTopologyError, TopController, KIND_STATEFUL_SET};
