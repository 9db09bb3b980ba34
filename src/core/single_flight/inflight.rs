//! In-process request coalescing

use super::types::{AtomicSingleFlightStats, SingleFlightStats};
use crate::utils::error::{Result, TravelError};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

type SharedOutcome<T> = Shared<BoxFuture<'static, Result<T>>>;
type InFlightMap<T> = Arc<Mutex<HashMap<String, SharedOutcome<T>>>>;

/// Removes the registry entry when the computation task ends, panics included
struct EntryGuard<T> {
    inflight: InFlightMap<T>,
    key: String,
}

impl<T> Drop for EntryGuard<T> {
    fn drop(&mut self) {
        self.inflight.lock().remove(&self.key);
    }
}

/// Map from key to the computation currently producing its value.
///
/// The first caller for a key spawns the computation; callers arriving while
/// it runs await the same shared outcome. The entry is removed as soon as the
/// computation settles, so the next caller starts fresh.
pub struct InFlightRegistry<T> {
    inflight: InFlightMap<T>,
    stats: Arc<AtomicSingleFlightStats>,
}

impl<T> Clone for InFlightRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            inflight: Arc::clone(&self.inflight),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<T> Default for InFlightRegistry<T> {
    fn default() -> Self {
        Self {
            inflight: Arc::new(Mutex::new(HashMap::new())),
            stats: Arc::new(AtomicSingleFlightStats::default()),
        }
    }
}

impl<T> InFlightRegistry<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_stats(stats: Arc<AtomicSingleFlightStats>) -> Self {
        Self {
            inflight: Arc::new(Mutex::new(HashMap::new())),
            stats,
        }
    }

    /// Run `compute` for `key` unless a computation for it is already in flight.
    ///
    /// The computation runs on its own task and completes even if every
    /// caller stops waiting.
    pub async fn run<F, Fut>(&self, key: &str, compute: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let outcome = {
            let mut inflight = self.inflight.lock();
            match inflight.get(key) {
                Some(existing) => {
                    AtomicSingleFlightStats::bump(&self.stats.followers);
                    debug!("Joining in-flight computation for {}", key);
                    existing.clone()
                }
                None => {
                    AtomicSingleFlightStats::bump(&self.stats.leaders);
                    let guard = EntryGuard {
                        inflight: Arc::clone(&self.inflight),
                        key: key.to_string(),
                    };
                    let work = compute();
                    let handle = tokio::spawn(async move {
                        let _guard = guard;
                        work.await
                    });

                    let shared = async move {
                        match handle.await {
                            Ok(result) => result,
                            Err(e) => Err(TravelError::from(e)),
                        }
                    }
                    .boxed()
                    .shared();

                    inflight.insert(key.to_string(), shared.clone());
                    shared
                }
            }
        };

        outcome.await
    }

    /// Whether a computation for `key` is running
    pub fn is_in_flight(&self, key: &str) -> bool {
        self.inflight.lock().contains_key(key)
    }

    /// Number of keys currently computing
    pub fn in_flight(&self) -> usize {
        self.inflight.lock().len()
    }

    /// Snapshot of leader / follower counts
    pub fn stats(&self) -> SingleFlightStats {
        self.stats.snapshot()
    }
}
