//! Pod topology collaborator
//!
//! Each allocation records which workload ultimately owns the pod. Walking
//! owner references up past intermediate ReplicaSets lives outside this
//! crate; the engine only consumes the answer.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use thiserror::Error;

/// Workload kind whose pods keep their identity across re-creation.
pub const KIND_STATEFUL_SET: &str = "StatefulSet";

/// Highest-level controller owning a pod (the workload, not the
/// intermediate ReplicaSet).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopController {
    pub kind: String,
    pub name: String,
}

#[derive(Debug, Error)]
#[error("pod topology lookup failed: {0}")]
pub struct PodTopologyError(pub String);

#[async_trait]
pub trait PodTopology: Send + Sync {
    async fn get_pod_top_controller(&self, pod: &Pod) -> Result<TopController, PodTopologyError>;
}
