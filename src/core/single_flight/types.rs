//! Single-flight statistics

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters shared by the registry and coordinator
#[derive(Debug, Default)]
pub(crate) struct AtomicSingleFlightStats {
    pub leaders: AtomicU64,
    pub followers: AtomicU64,
    pub lock_acquired: AtomicU64,
    pub lock_contended: AtomicU64,
    pub lock_errors: AtomicU64,
    pub poll_hits: AtomicU64,
    pub poll_timeouts: AtomicU64,
}

impl AtomicSingleFlightStats {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SingleFlightStats {
        SingleFlightStats {
            leaders: self.leaders.load(Ordering::Relaxed),
            followers: self.followers.load(Ordering::Relaxed),
            lock_acquired: self.lock_acquired.load(Ordering::Relaxed),
            lock_contended: self.lock_contended.load(Ordering::Relaxed),
            lock_errors: self.lock_errors.load(Ordering::Relaxed),
            poll_hits: self.poll_hits.load(Ordering::Relaxed),
            poll_timeouts: self.poll_timeouts.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of single-flight activity
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SingleFlightStats {
    /// Computations actually started in this process
    pub leaders: u64,
    /// Callers that joined an in-flight computation
    pub followers: u64,
    /// Distributed lock acquisitions
    pub lock_acquired: u64,
    /// Times another process held the lock
    pub lock_contended: u64,
    /// Lock store failures (computed without the lock)
    pub lock_errors: u64,
    /// Waits satisfied by another process's result
    pub poll_hits: u64,
    /// Waits that gave up and computed independently
    pub poll_timeouts: u64,
}
