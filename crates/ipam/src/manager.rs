//! IP pool manager
//!
//! The allocation, release, and rebind state machine. All coordination is
//! delegated to the store's conditional status write: each call refetches
//! the pool, mutates a copy of its ledger, and commits with the resource
//! version observed at read time. A losing writer sees a conflict, backs
//! off with jitter, and retries against the fresh ledger.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

use ipnet::IpNet;
use k8s_openapi::api::core::v1::Pod;
use kube::api::ListParams;
use kube::ResourceExt;
use rand::Rng;
use tracing::{debug, info};

use crds::{IPAllocation, IPAndContainerID, IPConfig, IPPool, IPPoolStatus};
use pool_store::{PoolStore, ReservedIPSource, StoreError};

use crate::config::IPPoolManagerConfig;
use crate::error::IpamError;
use crate::ip;
use crate::limiter::FreeIPsLimiter;
use crate::pods::{PodTopology, KIND_STATEFUL_SET};

/// Serves per-container IP assignment against declarative pools.
///
/// Holds no allocation state between calls; every operation refetches the
/// pool it touches. The only long-lived piece is the free-IPs limiter,
/// created once here and shared by all in-flight allocations.
pub struct IPPoolManager {
    config: IPPoolManagerConfig,
    free_ips_limiter: FreeIPsLimiter,
    store: Arc<dyn PoolStore>,
    reserved: Arc<dyn ReservedIPSource>,
    pods: Arc<dyn PodTopology>,
}

impl IPPoolManager {
    pub fn new(
        config: IPPoolManagerConfig,
        store: Arc<dyn PoolStore>,
        reserved: Arc<dyn ReservedIPSource>,
        pods: Arc<dyn PodTopology>,
    ) -> Self {
        let free_ips_limiter = FreeIPsLimiter::new(config.limiter.clone());
        Self {
            config,
            free_ips_limiter,
            store,
            reserved,
            pods,
        }
    }

    pub async fn get_ip_pool_by_name(&self, pool_name: &str) -> Result<IPPool, IpamError> {
        match self.store.get_pool(pool_name).await {
            Ok(pool) => Ok(pool),
            Err(StoreError::NotFound(_)) => Err(IpamError::PoolNotFound(pool_name.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_ip_pools(&self, params: &ListParams) -> Result<Vec<IPPool>, IpamError> {
        Ok(self.store.list_pools(params).await?)
    }

    /// Draw one free address from `pool_name` and bind it to the container.
    ///
    /// The address is picked uniformly at random from the available set, so
    /// competing allocators rarely collide and a losing writer's refetch
    /// almost always finds its candidate still free.
    pub async fn allocate_ip(
        &self,
        pool_name: &str,
        container_id: &str,
        nic: &str,
        pod: &Pod,
    ) -> Result<(IPConfig, IPPool), IpamError> {
        let mut attempt = 0;
        loop {
            let mut pool = self.get_ip_pool_by_name(pool_name).await?;

            let allocated_ip = self.gen_random_ip(&pool).await?;

            let top = self
                .pods
                .get_pod_top_controller(pod)
                .await
                .map_err(|source| IpamError::TopControllerUnavailable {
                    namespace: pod.namespace().unwrap_or_default(),
                    pod: pod.name_any(),
                    source,
                })?;

            let status = pool.status.get_or_insert_with(IPPoolStatus::default);
            status.allocated_ips.insert(
                allocated_ip.to_string(),
                IPAllocation {
                    container_id: container_id.to_string(),
                    nic: nic.to_string(),
                    node: pod
                        .spec
                        .as_ref()
                        .and_then(|spec| spec.node_name.clone())
                        .unwrap_or_default(),
                    namespace: pod.namespace().unwrap_or_default(),
                    pod: pod.name_any(),
                    owner_controller_kind: top.kind,
                    owner_controller_name: top.name,
                },
            );

            let count = status.allocated_ip_count.unwrap_or(0) + 1;
            status.allocated_ip_count = Some(count);
            if count > self.config.max_allocated_ips {
                return Err(IpamError::CeilingExceeded {
                    pool: pool_name.to_string(),
                    ceiling: self.config.max_allocated_ips,
                });
            }

            let ip_config = build_ip_config(allocated_ip, &pool, nic)?;

            match self.store.update_pool_status(&pool).await {
                Ok(stored) => {
                    info!(
                        pool = pool_name,
                        ip = %allocated_ip,
                        container = container_id,
                        "allocated IP"
                    );
                    return Ok((ip_config, stored));
                }
                Err(e) if e.is_conflict() => {
                    if attempt == self.config.max_conflict_retries {
                        return Err(self.retries_exhausted(pool_name, e));
                    }
                    debug!(pool = pool_name, attempt, "allocation write conflict, backing off");
                    self.backoff(attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Release the given addresses, each only if still owned by the named
    /// container. A release that matches nothing succeeds without writing,
    /// so a late release from a dead pod cannot erase a successor's
    /// binding to a reused address.
    pub async fn release_ip(
        &self,
        pool_name: &str,
        ip_and_cids: &[IPAndContainerID],
    ) -> Result<(), IpamError> {
        let mut attempt = 0;
        loop {
            let mut pool = self.get_ip_pool_by_name(pool_name).await?;
            let status = pool.status.get_or_insert_with(IPPoolStatus::default);

            let mut released = 0;
            for entry in ip_and_cids {
                let owned = status
                    .allocated_ips
                    .get(&entry.ip)
                    .is_some_and(|allocation| allocation.container_id == entry.container_id);
                if owned {
                    status.allocated_ips.remove(&entry.ip);
                    status.allocated_ip_count = Some(status.allocated_ip_count.unwrap_or(0) - 1);
                    released += 1;
                }
            }

            if released == 0 {
                return Ok(());
            }

            match self.store.update_pool_status(&pool).await {
                Ok(_) => {
                    info!(pool = pool_name, released, "released IPs");
                    return Ok(());
                }
                Err(e) if e.is_conflict() => {
                    if attempt == self.config.max_conflict_retries {
                        return Err(self.retries_exhausted(pool_name, e));
                    }
                    debug!(pool = pool_name, attempt, "release write conflict, backing off");
                    self.backoff(attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Re-point an existing binding at a re-created container.
    ///
    /// Pods of stable-identity workloads keep their IP across re-creation:
    /// the ledger entry is rewritten with the new container, NIC and node,
    /// and everything else is preserved. An entry already naming
    /// `container_id`, or one that has been vacated, is left untouched.
    pub async fn rebind_allocated_ip(
        &self,
        container_id: &str,
        pod: &Pod,
        old_ip_config: &IPConfig,
    ) -> Result<(), IpamError> {
        let ip = match old_ip_config.address.split_once('/') {
            Some((ip, _)) => ip,
            None => old_ip_config.address.as_str(),
        };

        let mut attempt = 0;
        loop {
            let mut pool = self.get_ip_pool_by_name(&old_ip_config.ip_pool).await?;
            let Some(status) = pool.status.as_mut() else {
                return Ok(());
            };
            let Some(allocation) = status.allocated_ips.get_mut(ip) else {
                // Vacated slot; filling it again is an allocation, not a rebind.
                return Ok(());
            };
            if allocation.container_id == container_id {
                return Ok(());
            }

            allocation.container_id = container_id.to_string();
            allocation.nic = old_ip_config.nic.clone();
            allocation.node = pod
                .spec
                .as_ref()
                .and_then(|spec| spec.node_name.clone())
                .unwrap_or_default();
            allocation.owner_controller_kind = KIND_STATEFUL_SET.to_string();

            match self.store.update_pool_status(&pool).await {
                Ok(_) => {
                    info!(
                        pool = %old_ip_config.ip_pool,
                        ip,
                        container = container_id,
                        "rebound IP"
                    );
                    return Ok(());
                }
                Err(e) if e.is_conflict() => {
                    if attempt == self.config.max_conflict_retries {
                        return Err(self.retries_exhausted(&old_ip_config.ip_pool, e));
                    }
                    debug!(
                        pool = %old_ip_config.ip_pool,
                        attempt,
                        "rebind write conflict, backing off"
                    );
                    self.backoff(attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Create `pool`; an existing pool of the same name counts as success.
    pub async fn create_ip_pool(&self, pool: &IPPool) -> Result<(), IpamError> {
        match self.store.create_pool(pool).await {
            Ok(_) => {
                info!(pool = %pool.name_any(), "created IPPool");
                Ok(())
            }
            Err(StoreError::AlreadyExists(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete `pool`; an already-absent pool counts as success.
    pub async fn delete_ip_pool(&self, pool: &IPPool) -> Result<(), IpamError> {
        match self.store.delete_pool(&pool.name_any()).await {
            Ok(()) => {
                info!(pool = %pool.name_any(), "deleted IPPool");
                Ok(())
            }
            Err(StoreError::NotFound(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Record the autoscaler's desired size; an unchanged value skips the
    /// write.
    pub async fn update_desired_ip_number(
        &self,
        pool: &IPPool,
        ip_number: i64,
    ) -> Result<(), IpamError> {
        let mut pool = pool.clone();
        let status = pool.status.get_or_insert_with(IPPoolStatus::default);
        if status.auto_desired_ip_count == Some(ip_number) {
            return Ok(());
        }
        status.auto_desired_ip_count = Some(ip_number);

        self.store.update_pool_status(&pool).await?;
        Ok(())
    }

    /// Group pools by VLAN tag. The flag is true when they all share one L2
    /// domain; pools without a tag group under vlan 0.
    pub async fn check_vlan_same(
        &self,
        pool_names: &[String],
    ) -> Result<(HashMap<i64, Vec<String>>, bool), IpamError> {
        let mut vlan_to_pools: HashMap<i64, Vec<String>> = HashMap::new();
        for pool_name in pool_names {
            let pool = self.get_ip_pool_by_name(pool_name).await?;
            vlan_to_pools
                .entry(pool.spec.vlan.unwrap_or(0))
                .or_default()
                .push(pool_name.clone());
        }

        let same = vlan_to_pools.len() <= 1;
        Ok((vlan_to_pools, same))
    }

    /// Compute the available set and draw one address from it.
    ///
    /// The limiter ticket covers the reserved-list read and the set
    /// arithmetic; both scale with pool size, so admission is serialized.
    async fn gen_random_ip(&self, pool: &IPPool) -> Result<IpAddr, IpamError> {
        let _ticket = self.free_ips_limiter.acquire().await?;

        let version = pool.spec.ip_version;
        let reserved_list = self.reserved.list_reserved().await?;
        let reserved_ips = ip::assemble_reserved_ips(version, &reserved_list)?;

        let used: Vec<String> = pool
            .status
            .as_ref()
            .map(|status| status.allocated_ips.keys().cloned().collect())
            .unwrap_or_default();
        let used_ips = ip::parse_ip_ranges(version, &used)?;

        let total_ips = ip::assemble_total_ips(version, &pool.spec.ips, &pool.spec.exclude_ips)?;

        let mut unavailable = reserved_ips;
        unavailable.extend(used_ips);
        let available = ip::ips_diff_set(&total_ips, &unavailable);
        if available.is_empty() {
            return Err(IpamError::PoolExhausted(pool.name_any()));
        }

        let index = rand::rng().random_range(0..available.len());
        Ok(available[index])
    }

    /// Sleep `uniform(0, 2^(attempt+1)) * unit`; the jitter keeps colliding
    /// writers from re-colliding on the next round. The exponent is capped
    /// so the shift cannot overflow.
    async fn backoff(&self, attempt: u32) {
        let exponent = attempt.min(61) + 1;
        let factor = rand::rng().random_range(0..1u64 << exponent);
        let factor = u32::try_from(factor).unwrap_or(u32::MAX);
        tokio::time::sleep(self.config.conflict_retry_unit_time.saturating_mul(factor)).await;
    }

    fn retries_exhausted(&self, pool_name: &str, source: StoreError) -> IpamError {
        IpamError::RetriesExhausted {
            pool: pool_name.to_string(),
            attempts: self.config.max_conflict_retries + 1,
            source,
        }
    }
}

/// Assemble the client-facing descriptor for a freshly drawn address.
fn build_ip_config(ip: IpAddr, pool: &IPPool, nic: &str) -> Result<IPConfig, IpamError> {
    let subnet: IpNet = pool
        .spec
        .subnet
        .parse()
        .map_err(|_| IpamError::MalformedRange(ip::RangeError::Invalid(pool.spec.subnet.clone())))?;

    Ok(IPConfig {
        address: format!("{}/{}", ip, subnet.prefix_len()),
        nic: nic.to_string(),
        gateway: pool.spec.gateway.clone(),
        ip_pool: pool.name_any(),
        vlan: pool.spec.vlan.unwrap_or(0),
        version: pool.spec.ip_version,
    })
}
