//! In-process coalescing plus cross-process lock-or-wait

use super::inflight::InFlightRegistry;
use super::lock::DistributedLock;
use super::types::{AtomicSingleFlightStats, SingleFlightStats};
use crate::utils::error::Result;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Wait policy for callers that lose the distributed lock
#[derive(Debug, Clone, Copy)]
pub struct WaitPolicy {
    /// Total time to wait for another process's result
    pub wait_timeout: Duration,
    /// Gap between polls
    pub poll_interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            wait_timeout: Duration::from_millis(4000),
            poll_interval: Duration::from_millis(150),
        }
    }
}

/// At most one computation per key per process, and best-effort one per key
/// across processes.
///
/// Without a lock the coordinator is just an [`InFlightRegistry`].
pub struct SingleFlightCoordinator<T> {
    registry: InFlightRegistry<T>,
    lock: Option<DistributedLock>,
    policy: WaitPolicy,
    stats: Arc<AtomicSingleFlightStats>,
}

impl<T> Clone for SingleFlightCoordinator<T> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            lock: self.lock.clone(),
            policy: self.policy,
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<T> SingleFlightCoordinator<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a coordinator; `lock` of `None` disables the cross-process step
    pub fn new(lock: Option<DistributedLock>, policy: WaitPolicy) -> Self {
        let stats = Arc::new(AtomicSingleFlightStats::default());
        Self {
            registry: InFlightRegistry::with_stats(Arc::clone(&stats)),
            lock,
            policy,
            stats,
        }
    }

    /// Produce the value for `key`.
    ///
    /// Concurrent callers in this process share one run. That run first tries
    /// the distributed lock: when held elsewhere it calls `poll` every
    /// `poll_interval` until a value appears or `wait_timeout` passes, then
    /// computes without the lock.
    pub async fn run<F, Fut, P, PFut>(&self, key: &str, compute: F, poll: P) -> Result<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        P: Fn() -> PFut + Send + Sync + 'static,
        PFut: Future<Output = Option<T>> + Send + 'static,
    {
        let Some(lock) = self.lock.clone() else {
            return self.registry.run(key, compute).await;
        };

        let owned_key = key.to_string();
        let policy = self.policy;
        let stats = Arc::clone(&self.stats);
        self.registry
            .run(key, move || {
                lock_or_wait(lock, owned_key, policy, stats, compute, poll)
            })
            .await
    }

    /// Whether this process is computing `key`
    pub fn is_in_flight(&self, key: &str) -> bool {
        self.registry.is_in_flight(key)
    }

    /// Whether a distributed lock is configured
    pub fn is_distributed(&self) -> bool {
        self.lock.is_some()
    }

    /// Snapshot of coalescing and lock activity
    pub fn stats(&self) -> SingleFlightStats {
        self.stats.snapshot()
    }
}

async fn lock_or_wait<T, F, Fut, P, PFut>(
    lock: DistributedLock,
    key: String,
    policy: WaitPolicy,
    stats: Arc<AtomicSingleFlightStats>,
    compute: F,
    poll: P,
) -> Result<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
    P: Fn() -> PFut,
    PFut: Future<Output = Option<T>>,
{
    match lock.try_acquire(&key).await {
        Ok(Some(guard)) => {
            AtomicSingleFlightStats::bump(&stats.lock_acquired);
            let outcome = compute().await;
            if let Err(e) = guard.release().await {
                warn!("Failed to release lock for {}: {}", key, e);
            }
            outcome
        }
        Ok(None) => {
            AtomicSingleFlightStats::bump(&stats.lock_contended);
            let deadline = Instant::now() + policy.wait_timeout;

            loop {
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                tokio::time::sleep(policy.poll_interval.min(deadline - now)).await;

                if let Some(value) = poll().await {
                    AtomicSingleFlightStats::bump(&stats.poll_hits);
                    debug!("Result for {} produced by another process", key);
                    return Ok(value);
                }
            }

            AtomicSingleFlightStats::bump(&stats.poll_timeouts);
            warn!(
                "Waited {:?} for {} without a result, computing independently",
                policy.wait_timeout, key
            );
            compute().await
        }
        Err(e) => {
            AtomicSingleFlightStats::bump(&stats.lock_errors);
            warn!("Lock store unavailable for {}, computing without lock: {}", key, e);
            compute().await
        }
    }
}
