//! Cache manager type definitions
//!
//! This module contains all the type definitions for the tiered cache,
//! including settings, cache entries, lookup results, and statistics.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Freshness windows and capacity of one cache namespace
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Window during which an entry is served as fresh
    pub fresh: Duration,
    /// Additional grace window during which a stale entry may be served
    pub stale: Duration,
    /// Maximum number of entries in the in-process tier
    pub max_size: usize,
    /// Deadline applied to every durable-tier operation
    pub durable_timeout: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            fresh: Duration::from_secs(600),
            stale: Duration::from_secs(1800),
            max_size: 500,
            durable_timeout: Duration::from_millis(500),
        }
    }
}

impl CacheSettings {
    /// Settings for the retrieval-result namespace
    pub fn from_config(config: &crate::config::CacheConfig) -> Self {
        Self {
            fresh: Duration::from_millis(config.fresh_ms),
            stale: Duration::from_millis(config.stale_ms),
            max_size: config.max_size,
            durable_timeout: Duration::from_millis(config.durable_timeout_ms),
        }
    }

    /// Durable-tier TTL in whole seconds, covering both windows
    pub fn durable_ttl_secs(fresh: Duration, stale: Duration) -> u64 {
        let total_ms = (fresh + stale).as_millis() as u64;
        total_ms.div_ceil(1000).max(1)
    }
}

/// Where an entry sits in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStatus {
    /// Within the primary validity window
    Fresh,
    /// Past freshness, inside the grace window; servable while refreshed
    Stale,
    /// Absent or past both windows
    Miss,
}

/// Cache entry with freshness metadata.
///
/// Timestamps are wall-clock epoch milliseconds so an entry written by one
/// process is judged the same way by another reading it from the durable tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// Normalized lookup key
    pub key: String,
    /// The cached value
    pub value: T,
    /// Last successful population
    pub created_at_ms: u64,
    /// Fresh window length
    pub fresh_ms: u64,
    /// Stale grace window length
    pub stale_ms: u64,
}

impl<T> CacheEntry<T> {
    /// Create an entry stamped with the current time
    pub fn new(key: impl Into<String>, value: T, fresh: Duration, stale: Duration) -> Self {
        Self::at(key, value, fresh, stale, now_ms())
    }

    /// Create an entry stamped with `created_at_ms`
    pub fn at(
        key: impl Into<String>,
        value: T,
        fresh: Duration,
        stale: Duration,
        created_at_ms: u64,
    ) -> Self {
        Self {
            key: key.into(),
            value,
            created_at_ms,
            fresh_ms: fresh.as_millis() as u64,
            stale_ms: stale.as_millis() as u64,
        }
    }

    /// Status of this entry as seen at `now_ms`
    pub fn status_at(&self, now_ms: u64) -> CacheStatus {
        let age = now_ms.saturating_sub(self.created_at_ms);
        if age < self.fresh_ms {
            CacheStatus::Fresh
        } else if age < self.fresh_ms.saturating_add(self.stale_ms) {
            CacheStatus::Stale
        } else {
            CacheStatus::Miss
        }
    }

    /// Status of this entry now
    pub fn status(&self) -> CacheStatus {
        self.status_at(now_ms())
    }
}

/// Result of a cache read
#[derive(Debug, Clone, PartialEq)]
pub struct CacheLookup<T> {
    /// Fresh, stale or miss
    pub status: CacheStatus,
    /// Present unless `status` is `Miss`
    pub value: Option<T>,
}

impl<T> CacheLookup<T> {
    /// Nothing usable
    pub fn miss() -> Self {
        Self {
            status: CacheStatus::Miss,
            value: None,
        }
    }

    pub(crate) fn hit(status: CacheStatus, value: T) -> Self {
        Self {
            status,
            value: Some(value),
        }
    }

    /// Whether a value is available
    pub fn is_hit(&self) -> bool {
        self.value.is_some()
    }

    /// Whether the value needs a background refresh
    pub fn is_stale(&self) -> bool {
        self.status == CacheStatus::Stale
    }
}

/// Current wall-clock time in epoch milliseconds
pub fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

/// Atomic cache statistics for lock-free hot path updates
#[derive(Debug, Default)]
pub struct AtomicCacheStats {
    /// In-process tier hits
    pub l1_hits: AtomicU64,
    /// Durable tier hits
    pub l2_hits: AtomicU64,
    /// Hits served from the stale window (either tier)
    pub stale_hits: AtomicU64,
    /// Lookups that found nothing usable
    pub misses: AtomicU64,
    /// Entries dropped from the in-process tier (expiry or capacity)
    pub evictions: AtomicU64,
    /// Durable tier failures swallowed as misses
    pub l2_errors: AtomicU64,
    /// Background refreshes started
    pub revalidations: AtomicU64,
    /// Background refreshes that failed
    pub revalidation_failures: AtomicU64,
    /// Expired values served as a last resort
    pub last_known_hits: AtomicU64,
}

/// Cache statistics snapshot (returned to callers)
#[derive(Debug, Default, Clone, Serialize)]
pub struct CacheStats {
    /// In-process tier hits
    pub l1_hits: u64,
    /// Durable tier hits
    pub l2_hits: u64,
    /// Hits served from the stale window
    pub stale_hits: u64,
    /// Lookups that found nothing usable
    pub misses: u64,
    /// In-process evictions
    pub evictions: u64,
    /// Durable tier failures
    pub l2_errors: u64,
    /// Background refreshes started
    pub revalidations: u64,
    /// Background refreshes that failed
    pub revalidation_failures: u64,
    /// Expired values served as a last resort
    pub last_known_hits: u64,
}

impl CacheStats {
    /// Calculate hit rate
    pub fn hit_rate(&self) -> f64 {
        let total_hits = self.l1_hits + self.l2_hits;
        let total_requests = total_hits + self.misses;

        if total_requests == 0 {
            0.0
        } else {
            total_hits as f64 / total_requests as f64
        }
    }
}

impl AtomicCacheStats {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Create a snapshot of current stats
    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            l1_hits: self.l1_hits.load(Ordering::Relaxed),
            l2_hits: self.l2_hits.load(Ordering::Relaxed),
            stale_hits: self.stale_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            l2_errors: self.l2_errors.load(Ordering::Relaxed),
            revalidations: self.revalidations.load(Ordering::Relaxed),
            revalidation_failures: self.revalidation_failures.load(Ordering::Relaxed),
            last_known_hits: self.last_known_hits.load(Ordering::Relaxed),
        }
    }

    /// Reset all stats to zero
    pub fn reset(&self) {
        for counter in [
            &self.l1_hits,
            &self.l2_hits,
            &self.stale_hits,
            &self.misses,
            &self.evictions,
            &self.l2_errors,
            &self.revalidations,
            &self.revalidation_failures,
            &self.last_known_hits,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
