//! Pool Store Gateway
//!
//! Read/write access to pool objects in the backing store, with
//! conflict-aware conditional status writes. The allocation engine never
//! talks to the API server directly; it goes through the [`PoolStore`] and
//! [`ReservedIPSource`] traits so tests can swap in an in-memory double.
//!
//! # Example
//!
//! ```no_run
//! use pool_store::{KubePoolStore, PoolStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = kube::Client::try_default().await?;
//! let store = KubePoolStore::new(client);
//!
//! let pool = store.get_pool("default-v4").await?;
//! println!("{} ranges declared", pool.spec.ips.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
#[cfg(feature = "test-util")]
pub mod mock;
#[path = "trait.rs"]
pub mod store_trait;

pub use client::KubePoolStore;
pub use error::StoreError;
#[cfg(feature = "test-util")]
pub use mock::MockPoolStore;
pub use store_trait::{PoolStore, ReservedIPSource};
