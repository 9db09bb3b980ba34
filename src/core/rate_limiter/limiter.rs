//! Core rate limiter implementation

use super::types::{AtomicLimiterStats, Job, QueueState, RateLimiterStats};
use crate::config::RateLimitConfig;
use crate::utils::error::{Result, TravelError};
use futures::FutureExt;
use futures::future::join_all;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, warn};

struct LimiterInner {
    max_requests: usize,
    window: Duration,
    state: Mutex<QueueState>,
    stats: AtomicLimiterStats,
}

/// Batch-windowed rate limiter for calls to an external API.
///
/// A pump task takes up to `max_requests` queued calls, starts them together,
/// waits for all of them, then sleeps `window` before taking the next batch.
/// Excess calls wait in FIFO order.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<LimiterInner>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            inner: Arc::new(LimiterInner {
                max_requests: max_requests.max(1),
                window,
                state: Mutex::new(QueueState::default()),
                stats: AtomicLimiterStats::default(),
            }),
        }
    }

    /// Create a rate limiter from configuration
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, Duration::from_millis(config.window_ms))
    }

    /// Queue `f` and resolve with its outcome once the pump has run it
    pub async fn schedule<F, Fut, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move || {
            async move {
                let outcome = f().await;
                let _ = tx.send(outcome);
            }
            .boxed()
        });

        let start_pump = {
            let mut state = self.inner.state.lock();
            state.pending.push_back(job);
            if state.pumping {
                false
            } else {
                state.pumping = true;
                true
            }
        };
        self.inner.stats.scheduled.fetch_add(1, Ordering::Relaxed);

        if start_pump {
            tokio::spawn(Self::pump(self.inner.clone()));
        }

        rx.await
            .map_err(|_| TravelError::internal("Rate-limited call was dropped before completing"))?
    }

    async fn pump(inner: Arc<LimiterInner>) {
        loop {
            let batch: Vec<Job> = {
                let mut state = inner.state.lock();
                if state.pending.is_empty() {
                    state.pumping = false;
                    return;
                }
                let take = inner.max_requests.min(state.pending.len());
                state.pending.drain(..take).collect()
            };

            inner.stats.batches.fetch_add(1, Ordering::Relaxed);
            debug!(batch = batch.len(), "Rate limiter dispatching batch");

            let handles: Vec<_> = batch
                .into_iter()
                .map(|job| {
                    let inner = inner.clone();
                    inner.stats.job_started();
                    tokio::spawn(async move {
                        job().await;
                        inner.stats.job_finished();
                    })
                })
                .collect();

            for outcome in join_all(handles).await {
                if let Err(e) = outcome {
                    // The caller sees a dropped channel; keep the counters honest.
                    inner.stats.in_flight.fetch_sub(1, Ordering::SeqCst);
                    warn!("Rate-limited call panicked: {}", e);
                }
            }

            // Always wait out the window, even if the queue is empty right now.
            tokio::time::sleep(inner.window).await;
        }
    }

    /// Statistics snapshot
    pub fn stats(&self) -> RateLimiterStats {
        let stats = &self.inner.stats;
        RateLimiterStats {
            scheduled: stats.scheduled.load(Ordering::Relaxed),
            completed: stats.completed.load(Ordering::Relaxed),
            batches: stats.batches.load(Ordering::Relaxed),
            queued: self.inner.state.lock().pending.len(),
            in_flight: stats.in_flight.load(Ordering::SeqCst),
            max_in_flight: stats.max_in_flight.load(Ordering::SeqCst),
        }
    }

    /// Maximum calls per batch
    pub fn max_requests(&self) -> usize {
        self.inner.max_requests
    }

    /// Pause between batches
    pub fn window(&self) -> Duration {
        self.inner.window
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max_requests", &self.inner.max_requests)
            .field("window", &self.inner.window)
            .finish()
    }
}
