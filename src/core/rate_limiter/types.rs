//! Rate limiter types and data structures

use futures::future::BoxFuture;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// A queued call, type-erased: running it drives the caller's future and
/// delivers the outcome through the caller's channel.
pub(super) type Job = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// Queue state guarded by the limiter's mutex
#[derive(Default)]
pub(super) struct QueueState {
    /// Pending calls in arrival order
    pub(super) pending: VecDeque<Job>,
    /// Whether a pump task is currently alive
    pub(super) pumping: bool,
}

/// Atomic counters updated by the pump
#[derive(Debug, Default)]
pub(super) struct AtomicLimiterStats {
    pub(super) scheduled: AtomicU64,
    pub(super) completed: AtomicU64,
    pub(super) batches: AtomicU64,
    pub(super) in_flight: AtomicUsize,
    pub(super) max_in_flight: AtomicUsize,
}

impl AtomicLimiterStats {
    pub(super) fn job_started(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    pub(super) fn job_finished(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::Relaxed);
    }
}

/// Rate limiter statistics snapshot
#[derive(Debug, Clone, Default, Serialize)]
pub struct RateLimiterStats {
    /// Calls accepted by `schedule`
    pub scheduled: u64,
    /// Calls that ran to completion
    pub completed: u64,
    /// Batches dispatched by the pump
    pub batches: u64,
    /// Calls waiting in the queue
    pub queued: usize,
    /// Calls currently executing
    pub in_flight: usize,
    /// Highest concurrency observed
    pub max_in_flight: usize,
}
