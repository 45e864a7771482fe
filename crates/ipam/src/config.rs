//! Engine configuration

use std::time::Duration;

use crate::limiter::LimiterConfig;

/// Tunables for the allocation engine.
///
/// Plain values; wiring them to flags or environment variables is the
/// embedding binary's job.
#[derive(Debug, Clone)]
pub struct IPPoolManagerConfig {
    /// Attempts beyond the first on write conflict
    pub max_conflict_retries: u32,

    /// Base unit of the jittered exponential backoff between attempts
    pub conflict_retry_unit_time: Duration,

    /// Per-pool allocation ceiling
    pub max_allocated_ips: i64,

    pub limiter: LimiterConfig,
}

impl Default for IPPoolManagerConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: 5,
            conflict_retry_unit_time: Duration::from_millis(300),
            max_allocated_ips: 5120,
            limiter: LimiterConfig::default(),
        }
    }
}
