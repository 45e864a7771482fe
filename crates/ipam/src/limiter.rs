//! Free-IPs admission limiter
//!
//! Computing a pool's available set is linear in the pool size and reads
//! the cluster-wide reserved list, so concurrent allocations are admitted
//! to that step one at a time through a bounded queue. Callers past the
//! queue bound, or still waiting when the deadline lapses, are turned away
//! instead of piling work onto the store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::timeout;

/// Queue sizing for the free-IPs limiter.
#[derive(Debug, Clone)]
pub struct LimiterConfig {
    /// Callers allowed to wait for admission at any moment
    pub max_queue_size: usize,
    /// Longest a caller waits before being turned away
    pub max_wait_time: Duration,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            max_queue_size: 1000,
            max_wait_time: Duration::from_secs(5),
        }
    }
}

/// Rejection reasons; both surface to callers as rate limiting.
#[derive(Debug, Error)]
pub enum LimiterError {
    #[error("admission queue is full ({0} waiting)")]
    QueueFull(usize),

    #[error("gave up waiting for admission after {0:?}")]
    DeadlineExceeded(Duration),
}

/// Bounded admission queue with one ticket outstanding at a time.
///
/// Constructed once per engine and shared by every in-flight allocation.
pub struct FreeIPsLimiter {
    semaphore: Arc<Semaphore>,
    waiting: AtomicUsize,
    config: LimiterConfig,
}

/// Admission ticket. Dropping it re-opens the slot.
#[derive(Debug)]
pub struct Ticket {
    _permit: OwnedSemaphorePermit,
}

impl FreeIPsLimiter {
    pub fn new(config: LimiterConfig) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(1)),
            waiting: AtomicUsize::new(0),
            config,
        }
    }

    /// Wait for admission. Fails immediately once the queue is at capacity,
    /// or after `max_wait_time` without a free slot.
    pub async fn acquire(&self) -> Result<Ticket, LimiterError> {
        let waiting = self.waiting.fetch_add(1, Ordering::SeqCst);
        if waiting >= self.config.max_queue_size {
            self.waiting.fetch_sub(1, Ordering::SeqCst);
            return Err(LimiterError::QueueFull(waiting));
        }

        let acquired = timeout(
            self.config.max_wait_time,
            Arc::clone(&self.semaphore).acquire_owned(),
        )
        .await;
        self.waiting.fetch_sub(1, Ordering::SeqCst);

        match acquired {
            Ok(Ok(permit)) => Ok(Ticket { _permit: permit }),
            // The semaphore lives as long as the limiter and is never
            // closed, so a closed-semaphore result cannot happen.
            Ok(Err(_)) | Err(_) => Err(LimiterError::DeadlineExceeded(self.config.max_wait_time)),
        }
    }
}
