//! Store traits for mocking
//!
//! These abstract the backing store so the allocation engine can run
//! against a live API server or an in-memory double in unit tests.
//! All async methods must be `Send` to work with Tokio's work-stealing
//! runtime.

use async_trait::async_trait;
use crds::{IPPool, ReservedIP};
use kube::api::ListParams;

use crate::error::StoreError;

/// Conditional-write gateway for pool objects.
///
/// `update_pool_status` must fail with [`StoreError::Conflict`] iff the
/// object's resource version at write time differs from the version carried
/// by `pool`. That conflict is the engine's only serialization point.
#[async_trait]
pub trait PoolStore: Send + Sync {
    async fn get_pool(&self, name: &str) -> Result<IPPool, StoreError>;

    async fn list_pools(&self, params: &ListParams) -> Result<Vec<IPPool>, StoreError>;

    async fn create_pool(&self, pool: &IPPool) -> Result<IPPool, StoreError>;

    async fn delete_pool(&self, name: &str) -> Result<(), StoreError>;

    /// Conditionally replace the status subresource, returning the stored
    /// object with its new resource version.
    async fn update_pool_status(&self, pool: &IPPool) -> Result<IPPool, StoreError>;
}

/// Read-only projection of the cluster's reserved address lists.
#[async_trait]
pub trait ReservedIPSource: Send + Sync {
    async fn list_reserved(&self) -> Result<Vec<ReservedIP>, StoreError>;
}
