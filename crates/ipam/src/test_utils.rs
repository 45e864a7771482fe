//! Test fixtures shared by the engine test suite.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Pod, PodSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use pool_store::MockPoolStore;

use crds::{IPAllocation, IPPool, IPPoolSpec, IPPoolStatus, IPV4};

use crate::config::IPPoolManagerConfig;
use crate::manager::IPPoolManager;
use crate::pods::{PodTopology, PodTopologyError, TopController};

/// Stub resolver returning a fixed owning workload kind.
pub struct StubPodTopology {
    pub kind: &'static str,
    pub fail: bool,
}

#[async_trait]
impl PodTopology for StubPodTopology {
    async fn get_pod_top_controller(&self, pod: &Pod) -> Result<TopController, PodTopologyError> {
        if self.fail {
            return Err(PodTopologyError("owner references unreadable".to_string()));
        }
        Ok(TopController {
            kind: self.kind.to_string(),
            name: format!("{}-owner", pod.metadata.name.as_deref().unwrap_or("pod")),
        })
    }
}

pub fn test_manager(store: &MockPoolStore, config: IPPoolManagerConfig) -> IPPoolManager {
    IPPoolManager::new(
        config,
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(StubPodTopology {
            kind: "Deployment",
            fail: false,
        }),
    )
}

/// Default config with a backoff unit short enough for retry tests.
pub fn fast_config() -> IPPoolManagerConfig {
    IPPoolManagerConfig {
        conflict_retry_unit_time: Duration::from_millis(1),
        ..IPPoolManagerConfig::default()
    }
}

pub fn create_test_pool(name: &str, ips: &[&str]) -> IPPool {
    IPPool {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        spec: IPPoolSpec {
            ip_version: IPV4,
            subnet: "10.0.0.0/24".to_string(),
            ips: ips.iter().map(|s| s.to_string()).collect(),
            exclude_ips: Vec::new(),
            gateway: Some("10.0.0.254".to_string()),
            vlan: Some(0),
        },
        status: None,
    }
}

pub fn create_test_pod(namespace: &str, name: &str, node: &str) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        spec: Some(PodSpec {
            node_name: Some(node.to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn allocation(container_id: &str) -> IPAllocation {
    IPAllocation {
        container_id: container_id.to_string(),
        nic: "eth0".to_string(),
        node: "node-a".to_string(),
        namespace: "default".to_string(),
        pod: "p1".to_string(),
        owner_controller_kind: "Deployment".to_string(),
        owner_controller_name: "p1-owner".to_string(),
    }
}

/// Seed `pool` with ledger entries and a matching counter.
pub fn with_allocations(mut pool: IPPool, entries: &[(&str, IPAllocation)]) -> IPPool {
    let status = pool.status.get_or_insert_with(IPPoolStatus::default);
    for (ip, alloc) in entries {
        status.allocated_ips.insert(ip.to_string(), alloc.clone());
    }
    status.allocated_ip_count = Some(status.allocated_ips.len() as i64);
    pool
}
