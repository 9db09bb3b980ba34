//! Tiered cache implementation
//!
//! L1 is an in-process LRU, L2 an optional durable store shared across
//! processes. Reads consult L2 first and fall back to L1; writes go to both.
//! Every durable failure is logged and treated as a miss.

use super::types::{
    AtomicCacheStats, CacheEntry, CacheLookup, CacheSettings, CacheStats, CacheStatus, now_ms,
};
use crate::core::traits::DurableStore;
use crate::utils::error::{Result, TravelError, with_timeout};
use lru::LruCache;
use parking_lot::Mutex;
use serde::{Serialize, de::DeserializeOwned};
use std::collections::HashSet;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Values that can live in both cache tiers
pub trait Cacheable: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> Cacheable for T where T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

struct CacheInner<T> {
    namespace: String,
    settings: CacheSettings,
    /// L1 cache: in-memory LRU for hot data
    l1: Mutex<LruCache<String, CacheEntry<T>>>,
    /// Values pushed out of L1, kept as a last resort
    last_known: Mutex<LruCache<String, T>>,
    /// L2 cache: shared durable store
    durable: Option<Arc<dyn DurableStore>>,
    /// Keys with a background refresh in progress
    revalidating: Mutex<HashSet<String>>,
    stats: AtomicCacheStats,
}

/// Two-tier cache with stale-while-revalidate
pub struct TieredCache<T> {
    inner: Arc<CacheInner<T>>,
}

impl<T> Clone for TieredCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for TieredCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredCache")
            .field("namespace", &self.inner.namespace)
            .field("settings", &self.inner.settings)
            .field("durable", &self.inner.durable.as_ref().map(|d| d.backend()))
            .finish()
    }
}

/// Clears the revalidation mark when the refresh task ends, even on panic
struct RevalidationSlot<T> {
    inner: Arc<CacheInner<T>>,
    key: String,
}

impl<T> Drop for RevalidationSlot<T> {
    fn drop(&mut self) {
        self.inner.revalidating.lock().remove(&self.key);
    }
}

impl<T: Cacheable> TieredCache<T> {
    /// Create a cache namespace. `durable` of `None` means in-process only.
    pub fn new(
        namespace: impl Into<String>,
        settings: CacheSettings,
        durable: Option<Arc<dyn DurableStore>>,
    ) -> Result<Self> {
        let capacity = NonZeroUsize::new(settings.max_size).ok_or_else(|| {
            TravelError::config("Invalid cache configuration: max_size must be greater than 0")
        })?;

        Ok(Self {
            inner: Arc::new(CacheInner {
                namespace: namespace.into(),
                settings,
                l1: Mutex::new(LruCache::new(capacity)),
                last_known: Mutex::new(LruCache::new(capacity)),
                durable,
                revalidating: Mutex::new(HashSet::new()),
                stats: AtomicCacheStats::default(),
            }),
        })
    }

    /// Look up `key`, durable tier first.
    ///
    /// Never fails: durable errors degrade to the in-process tier. When both
    /// tiers hold the key the more recently written entry wins.
    pub async fn get(&self, key: &str) -> CacheLookup<T> {
        let now = now_ms();

        if let Some(entry) = self.read_durable(key).await {
            let status = entry.status_at(now);
            if status != CacheStatus::Miss && !self.has_newer_local(&entry) {
                AtomicCacheStats::bump(&self.inner.stats.l2_hits);
                if status == CacheStatus::Stale {
                    AtomicCacheStats::bump(&self.inner.stats.stale_hits);
                }
                debug!("L2 cache {:?} hit for {}:{}", status, self.inner.namespace, key);
                let value = entry.value.clone();
                self.remember(entry);
                return CacheLookup::hit(status, value);
            }
        }

        self.get_local_at(key, now)
    }

    /// Look up `key` and, when the value is stale, refresh it in the background
    pub async fn get_or_revalidate<F, Fut>(&self, key: &str, refresh: F) -> CacheLookup<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let lookup = self.get(key).await;
        if lookup.is_stale() {
            self.revalidate_in_background(key, refresh);
        }
        lookup
    }

    /// In-process tier only, as seen at `now`
    fn get_local_at(&self, key: &str, now: u64) -> CacheLookup<T> {
        let mut l1 = self.inner.l1.lock();
        let status = match l1.get(key) {
            Some(entry) => entry.status_at(now),
            None => {
                drop(l1);
                AtomicCacheStats::bump(&self.inner.stats.misses);
                debug!("Cache miss for {}:{}", self.inner.namespace, key);
                return CacheLookup::miss();
            }
        };

        if status == CacheStatus::Miss {
            let expired = l1.pop(key);
            drop(l1);
            if let Some(expired) = expired {
                self.shelve(key.to_string(), expired.value);
            }
            AtomicCacheStats::bump(&self.inner.stats.evictions);
            AtomicCacheStats::bump(&self.inner.stats.misses);
            debug!("Evicted expired entry {}:{}", self.inner.namespace, key);
            return CacheLookup::miss();
        }

        let value = l1.peek(key).map(|entry| entry.value.clone());
        drop(l1);

        match value {
            Some(value) => {
                AtomicCacheStats::bump(&self.inner.stats.l1_hits);
                if status == CacheStatus::Stale {
                    AtomicCacheStats::bump(&self.inner.stats.stale_hits);
                }
                debug!("L1 cache {:?} hit for {}:{}", status, self.inner.namespace, key);
                CacheLookup::hit(status, value)
            }
            None => CacheLookup::miss(),
        }
    }

    /// Any value ever held for `key`, regardless of age.
    ///
    /// Last resort for callers that prefer old data to no data.
    pub fn get_any(&self, key: &str) -> Option<T> {
        if let Some(entry) = self.inner.l1.lock().peek(key) {
            return Some(entry.value.clone());
        }

        let value = self.inner.last_known.lock().get(key).cloned();
        if value.is_some() {
            AtomicCacheStats::bump(&self.inner.stats.last_known_hits);
            debug!("Serving last known value for {}:{}", self.inner.namespace, key);
        }
        value
    }

    /// Write through both tiers with the namespace's fresh window
    pub async fn set(&self, key: &str, value: T) {
        self.set_with(key, value, self.inner.settings.fresh).await;
    }

    /// Write through both tiers with an explicit fresh window
    pub async fn set_with(&self, key: &str, value: T, fresh: Duration) {
        let entry = CacheEntry::new(key, value, fresh, self.inner.settings.stale);
        self.write_durable(&entry).await;
        self.store_local(entry);
    }

    /// Refresh `key` on a detached task. Returns `false` if one is already running.
    ///
    /// Failures are logged and counted, never returned to anyone.
    pub fn revalidate_in_background<F, Fut>(&self, key: &str, refresh: F) -> bool
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let cache = self.clone();
        let owned_key = key.to_string();
        self.refresh_in_background(key, move || async move {
            let value = refresh().await?;
            cache.set(&owned_key, value).await;
            Ok::<(), TravelError>(())
        })
    }

    /// Like [`revalidate_in_background`](Self::revalidate_in_background), for
    /// refreshes that write the cache themselves, or find it already updated.
    pub fn refresh_in_background<F, Fut>(&self, key: &str, refresh: F) -> bool
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        if !self.inner.revalidating.lock().insert(key.to_string()) {
            debug!(
                "Revalidation already running for {}:{}",
                self.inner.namespace, key
            );
            return false;
        }

        AtomicCacheStats::bump(&self.inner.stats.revalidations);
        let cache = self.clone();
        let slot = RevalidationSlot {
            inner: Arc::clone(&self.inner),
            key: key.to_string(),
        };

        tokio::spawn(async move {
            let key = slot.key.clone();
            match refresh().await {
                Ok(()) => debug!("Revalidated {}:{}", cache.inner.namespace, key),
                Err(e) => {
                    AtomicCacheStats::bump(&cache.inner.stats.revalidation_failures);
                    warn!(
                        "Background revalidation failed for {}:{}: {}",
                        cache.inner.namespace, key, e
                    );
                }
            }
            drop(slot);
        });

        true
    }

    /// Whether a background refresh for `key` is in progress
    pub fn is_revalidating(&self, key: &str) -> bool {
        self.inner.revalidating.lock().contains(key)
    }

    /// Entries currently held in the in-process tier
    pub fn len(&self) -> usize {
        self.inner.l1.lock().len()
    }

    /// Whether the in-process tier is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop in-process state. The durable tier expires on its own.
    pub fn clear(&self) {
        self.inner.l1.lock().clear();
        self.inner.last_known.lock().clear();
    }

    /// Get cache statistics (lock-free snapshot)
    pub fn stats(&self) -> CacheStats {
        self.inner.stats.snapshot()
    }

    /// Namespace prefix used for durable keys
    pub fn namespace(&self) -> &str {
        &self.inner.namespace
    }

    /// Configured windows and capacity
    pub fn settings(&self) -> &CacheSettings {
        &self.inner.settings
    }

    /// Whether a durable tier is attached
    pub fn has_durable(&self) -> bool {
        self.inner.durable.is_some()
    }

    fn durable_key(&self, key: &str) -> String {
        format!("{}:{}", self.inner.namespace, key)
    }

    fn has_newer_local(&self, entry: &CacheEntry<T>) -> bool {
        self.inner
            .l1
            .lock()
            .peek(&entry.key)
            .is_some_and(|local| local.created_at_ms > entry.created_at_ms)
    }

    /// Put an entry read from L2 into L1 unless L1 already holds something as new
    fn remember(&self, entry: CacheEntry<T>) {
        let same_or_newer_local = self
            .inner
            .l1
            .lock()
            .peek(&entry.key)
            .is_some_and(|local| local.created_at_ms >= entry.created_at_ms);
        if !same_or_newer_local {
            self.store_local(entry);
        }
    }

    fn store_local(&self, entry: CacheEntry<T>) {
        let key = entry.key.clone();
        let displaced = self.inner.l1.lock().push(key.clone(), entry);
        self.inner.last_known.lock().pop(&key);

        match displaced {
            Some((old_key, old)) if old_key != key => {
                AtomicCacheStats::bump(&self.inner.stats.evictions);
                debug!(
                    "Evicted least recently used entry {}:{}",
                    self.inner.namespace, old_key
                );
                self.shelve(old_key, old.value);
            }
            _ => {}
        }
    }

    fn shelve(&self, key: String, value: T) {
        self.inner.last_known.lock().put(key, value);
    }

    async fn read_durable(&self, key: &str) -> Option<CacheEntry<T>> {
        let store = Arc::clone(self.inner.durable.as_ref()?);
        let durable_key = self.durable_key(key);

        let read = with_timeout(
            async move { store.get_json(&durable_key).await },
            self.inner.settings.durable_timeout,
            "durable_get",
        )
        .await;

        match read {
            Ok(Some(raw)) => match serde_json::from_value::<CacheEntry<T>>(raw) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    self.durable_failed("decode", key, &e.into());
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                self.durable_failed("read", key, &e);
                None
            }
        }
    }

    async fn write_durable(&self, entry: &CacheEntry<T>) {
        let Some(store) = self.inner.durable.as_ref().map(Arc::clone) else {
            return;
        };

        let payload = match serde_json::to_value(entry) {
            Ok(payload) => payload,
            Err(e) => {
                self.durable_failed("encode", &entry.key, &e.into());
                return;
            }
        };
        let ttl_secs = CacheSettings::durable_ttl_secs(
            Duration::from_millis(entry.fresh_ms),
            Duration::from_millis(entry.stale_ms),
        );
        let durable_key = self.durable_key(&entry.key);

        let write = with_timeout(
            async move { store.set_json(&durable_key, &payload, ttl_secs).await },
            self.inner.settings.durable_timeout,
            "durable_set",
        )
        .await;

        if let Err(e) = write {
            self.durable_failed("write", &entry.key, &e);
        }
    }

    fn durable_failed(&self, operation: &str, key: &str, error: &TravelError) {
        AtomicCacheStats::bump(&self.inner.stats.l2_errors);
        warn!(
            "Durable cache {} failed for {}:{}, continuing in-process: {}",
            operation, self.inner.namespace, key, error
        );
    }
}
