//! Engine errors

use pool_store::StoreError;
use thiserror::Error;

use crate::ip::RangeError;
use crate::limiter::LimiterError;
use crate::pods::PodTopologyError;

/// Failures surfaced by the allocation engine.
///
/// Write conflicts never appear here: the retry loop absorbs them, and only
/// their exhaustion is reported as [`IpamError::RetriesExhausted`].
#[derive(Debug, Error)]
pub enum IpamError {
    #[error("IPPool {0} not found")]
    PoolNotFound(String),

    /// A range expression in the pool, the reserved lists, or the ledger
    /// could not be expanded
    #[error(transparent)]
    MalformedRange(#[from] RangeError),

    /// The available set is empty
    #[error("all IPs of IPPool {0} are used out")]
    PoolExhausted(String),

    /// Committing would exceed the per-pool allocation ceiling
    #[error("threshold of IP allocations (<={ceiling}) for IPPool {pool} exceeded")]
    CeilingExceeded { pool: String, ceiling: i64 },

    /// The free-IPs limiter turned the request away
    #[error("allocation request rejected: {0}")]
    RateLimited(#[from] LimiterError),

    #[error("failed to resolve top controller for pod {namespace}/{pod}: {source}")]
    TopControllerUnavailable {
        namespace: String,
        pod: String,
        #[source]
        source: PodTopologyError,
    },

    /// Every attempt lost the conditional-write race
    #[error("retries exhausted, conditional write to IPPool {pool} failed {attempts} times: {source}")]
    RetriesExhausted {
        pool: String,
        attempts: u32,
        #[source]
        source: StoreError,
    },

    /// Any other backing-store failure
    #[error(transparent)]
    Store(#[from] StoreError),
}
