//! Mock pool store for unit testing
//!
//! Keeps pools in memory behind the same traits as the live gateway, with
//! the API server's optimistic-concurrency contract intact: every stored
//! pool carries a resource version, and a status write whose version does
//! not match the stored one fails with [`StoreError::Conflict`]. Tests can
//! additionally queue artificial conflicts to exercise retry paths.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use crds::{IPPool, ReservedIP};
use kube::api::ListParams;
use kube::ResourceExt;

use crate::error::StoreError;
use crate::store_trait::{PoolStore, ReservedIPSource};

/// In-memory stand-in for [`crate::KubePoolStore`].
#[derive(Clone, Default)]
pub struct MockPoolStore {
    pools: Arc<Mutex<HashMap<String, IPPool>>>,
    reserved: Arc<Mutex<Vec<ReservedIP>>>,
    injected_conflicts: Arc<Mutex<u32>>,
    next_version: Arc<Mutex<u64>>,
}

impl MockPoolStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a pool (for test setup); stamps an initial resource version.
    pub fn add_pool(&self, mut pool: IPPool) {
        let version = self.bump_version();
        pool.metadata.resource_version = Some(version.to_string());
        self.pools.lock().unwrap().insert(pool.name_any(), pool);
    }

    /// Seed a reserved list (for test setup).
    pub fn add_reserved(&self, reserved: ReservedIP) {
        self.reserved.lock().unwrap().push(reserved);
    }

    /// Fail the next `n` status writes with a conflict regardless of the
    /// carried resource version.
    pub fn inject_status_conflicts(&self, n: u32) {
        *self.injected_conflicts.lock().unwrap() += n;
    }

    /// Current stored copy of `name`, if any (for assertions).
    pub fn stored_pool(&self, name: &str) -> Option<IPPool> {
        self.pools.lock().unwrap().get(name).cloned()
    }

    fn bump_version(&self) -> u64 {
        let mut version = self.next_version.lock().unwrap();
        *version += 1;
        *version
    }
}

#[async_trait]
impl PoolStore for MockPoolStore {
    async fn get_pool(&self, name: &str) -> Result<IPPool, StoreError> {
        self.pools
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    async fn list_pools(&self, _params: &ListParams) -> Result<Vec<IPPool>, StoreError> {
        // Selector filtering is not modeled; tests list everything.
        Ok(self.pools.lock().unwrap().values().cloned().collect())
    }

    async fn create_pool(&self, pool: &IPPool) -> Result<IPPool, StoreError> {
        let name = pool.name_any();
        let version = self.bump_version();
        let mut pools = self.pools.lock().unwrap();
        if pools.contains_key(&name) {
            return Err(StoreError::AlreadyExists(name));
        }
        let mut stored = pool.clone();
        stored.metadata.resource_version = Some(version.to_string());
        pools.insert(name, stored.clone());
        Ok(stored)
    }

    async fn delete_pool(&self, name: &str) -> Result<(), StoreError> {
        self.pools
            .lock()
            .unwrap()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    async fn update_pool_status(&self, pool: &IPPool) -> Result<IPPool, StoreError> {
        let name = pool.name_any();
        {
            let mut injected = self.injected_conflicts.lock().unwrap();
            if *injected > 0 {
                *injected -= 1;
                return Err(StoreError::Conflict(name));
            }
        }
        let version = self.bump_version();
        let mut pools = self.pools.lock().unwrap();
        let stored = pools
            .get_mut(&name)
            .ok_or_else(|| StoreError::NotFound(name.clone()))?;
        if stored.metadata.resource_version != pool.metadata.resource_version {
            return Err(StoreError::Conflict(name));
        }
        stored.status = pool.status.clone();
        stored.metadata.resource_version = Some(version.to_string());
        Ok(stored.clone())
    }
}

#[async_trait]
impl ReservedIPSource for MockPoolStore {
    async fn list_reserved(&self) -> Result<Vec<ReservedIP>, StoreError> {
        Ok(self.reserved.lock().unwrap().clone())
    }
}
