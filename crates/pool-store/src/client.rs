//! Kubernetes-backed pool store
//!
//! Implements the store gateway against the cluster API server. Status
//! writes go through the status subresource carrying the resource version
//! observed at read time, so a stale writer receives a 409 instead of
//! clobbering a newer ledger.

use async_trait::async_trait;
use crds::{IPPool, ReservedIP};
use kube::api::{DeleteParams, ListParams, PostParams};
use kube::{Api, Client, ResourceExt};
use tracing::debug;

use crate::error::StoreError;
use crate::store_trait::{PoolStore, ReservedIPSource};

/// Store gateway backed by the cluster API server.
///
/// Pools and reserved lists are cluster-scoped, so a single client serves
/// every namespace.
#[derive(Clone)]
pub struct KubePoolStore {
    pools: Api<IPPool>,
    reserved: Api<ReservedIP>,
}

impl KubePoolStore {
    pub fn new(client: Client) -> Self {
        Self {
            pools: Api::all(client.clone()),
            reserved: Api::all(client),
        }
    }
}

#[async_trait]
impl PoolStore for KubePoolStore {
    async fn get_pool(&self, name: &str) -> Result<IPPool, StoreError> {
        self.pools
            .get(name)
            .await
            .map_err(|e| StoreError::classify(name, e))
    }

    async fn list_pools(&self, params: &ListParams) -> Result<Vec<IPPool>, StoreError> {
        let list = self.pools.list(params).await?;
        Ok(list.items)
    }

    async fn create_pool(&self, pool: &IPPool) -> Result<IPPool, StoreError> {
        let name = pool.name_any();
        debug!(pool = %name, "creating IPPool");
        self.pools
            .create(&PostParams::default(), pool)
            .await
            .map_err(|e| StoreError::classify(&name, e))
    }

    async fn delete_pool(&self, name: &str) -> Result<(), StoreError> {
        debug!(pool = %name, "deleting IPPool");
        self.pools
            .delete(name, &DeleteParams::default())
            .await
            .map(|_| ())
            .map_err(|e| StoreError::classify(name, e))
    }

    async fn update_pool_status(&self, pool: &IPPool) -> Result<IPPool, StoreError> {
        let name = pool.name_any();
        let data = serde_json::to_vec(pool)?;
        debug!(pool = %name, version = ?pool.resource_version(), "conditional status write");
        self.pools
            .replace_status(&name, &PostParams::default(), data)
            .await
            .map_err(|e| StoreError::classify(&name, e))
    }
}

#[async_trait]
impl ReservedIPSource for KubePoolStore {
    async fn list_reserved(&self) -> Result<Vec<ReservedIP>, StoreError> {
        let list = self.reserved.list(&ListParams::default()).await?;
        Ok(list.items)
    }
}
