//! Retrieval pipeline
//!
//! `CheckCache -> AcquireSlot -> Embed -> VectorQuery -> (Fallback) ->
//! PersistCache -> Return`. Every network step runs under a deadline, every
//! failure first tries a cheaper source, and only `ExhaustedFallback` leaves
//! this module as an error.

use super::embedder::CachedEmbedder;
use super::filter::{extract_destination, filter_by_location};
use super::types::{
    HotelItem, RetrievalQuery, RetrievalResponse, RetrievalResult, RetrievalSource, ServedFrom,
};
use crate::config::{Config, RetrievalConfig};
use crate::core::cache_manager::types::now_ms;
use crate::core::cache_manager::{CacheSettings, CacheStats, CacheStatus, TieredCache};
use crate::core::rate_limiter::{RateLimiter, RateLimiterStats};
use crate::core::single_flight::{
    DistributedLock, SingleFlightCoordinator, SingleFlightStats, WaitPolicy,
};
use crate::core::traits::{DurableStore, EmbeddingProvider, HotelSearchApi, VectorIndex};
use crate::storage::vector::VectorPoint;
use crate::utils::error::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerMetrics, Result, TravelError,
    with_timeout,
};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Namespace of retrieval results in the durable tier
pub const RESULT_NAMESPACE: &str = "retrieval";
/// Namespace of cached embeddings in the durable tier
pub const EMBEDDING_NAMESPACE: &str = "embedding";
/// Prefix of distributed lock keys
pub const LOCK_PREFIX: &str = "lock:retrieval";

/// Deadlines and sizing of the pipeline
#[derive(Debug, Clone)]
pub struct RetrievalSettings {
    /// Embedding call deadline
    pub embedding_timeout: Duration,
    /// Vector query deadline
    pub vector_timeout: Duration,
    /// Hotel API call deadline
    pub api_timeout: Duration,
    /// Items returned when the caller does not ask for a count
    pub default_top_k: usize,
    /// Candidates fetched per wanted item, to survive the locality filter
    pub candidate_multiplier: usize,
    /// Embed and upsert hotel API results into the vector index
    pub index_api_results: bool,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self::from_config(&RetrievalConfig::default())
    }
}

impl RetrievalSettings {
    /// Settings from the `retrieval` config section
    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self {
            embedding_timeout: Duration::from_millis(config.embedding_timeout_ms),
            vector_timeout: Duration::from_millis(config.vector_query_timeout_ms),
            api_timeout: Duration::from_millis(config.hotel_api_timeout_ms),
            default_top_k: config.default_top_k.max(1),
            candidate_multiplier: config.candidate_multiplier.max(1),
            index_api_results: config.index_api_results,
        }
    }
}

/// External collaborators of the pipeline
#[derive(Clone)]
pub struct RetrievalDeps {
    /// Text to vector
    pub embedder: Arc<dyn EmbeddingProvider>,
    /// Nearest-neighbour index
    pub index: Arc<dyn VectorIndex>,
    /// Third-party hotel search, if configured
    pub hotel_api: Option<Arc<dyn HotelSearchApi>>,
    /// Shared durable tier, if reachable
    pub durable: Option<Arc<dyn DurableStore>>,
}

/// Internal building blocks, for callers that wire them by hand
pub struct RetrievalComponents {
    /// Embedding provider behind its cache
    pub embedder: CachedEmbedder,
    /// Nearest-neighbour index
    pub index: Arc<dyn VectorIndex>,
    /// Third-party hotel search, if configured
    pub hotel_api: Option<Arc<dyn HotelSearchApi>>,
    /// Result cache
    pub cache: TieredCache<RetrievalResult>,
    /// Per-key coordination
    pub flights: SingleFlightCoordinator<RetrievalResult>,
    /// Breaker in front of the hotel API
    pub breaker: CircuitBreaker,
    /// Request pacing for the hotel API
    pub limiter: RateLimiter,
}

#[derive(Debug, Default)]
struct AtomicRetrievalStats {
    requests: AtomicU64,
    computations: AtomicU64,
    vector_failures: AtomicU64,
    api_calls: AtomicU64,
    api_failures: AtomicU64,
    api_skipped: AtomicU64,
    unfiltered_fallbacks: AtomicU64,
    last_known_fallbacks: AtomicU64,
    exhausted: AtomicU64,
    index_upserts: AtomicU64,
    index_upsert_failures: AtomicU64,
}

/// Pipeline counters
#[derive(Debug, Default, Clone, Serialize)]
pub struct RetrievalStats {
    /// Calls to `retrieve`
    pub requests: u64,
    /// Pipeline runs (cache misses and revalidations)
    pub computations: u64,
    /// Embed or vector query failures and timeouts
    pub vector_failures: u64,
    /// Hotel API calls attempted
    pub api_calls: u64,
    /// Hotel API calls that failed
    pub api_failures: u64,
    /// Hotel API calls skipped while the breaker was open
    pub api_skipped: u64,
    /// Results served from unfiltered vector candidates
    pub unfiltered_fallbacks: u64,
    /// Results served from expired cache entries
    pub last_known_fallbacks: u64,
    /// Requests no source could answer
    pub exhausted: u64,
    /// Background upserts of hotel API results
    pub index_upserts: u64,
    /// Background upserts that failed
    pub index_upsert_failures: u64,
}

impl AtomicRetrievalStats {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> RetrievalStats {
        RetrievalStats {
            requests: self.requests.load(Ordering::Relaxed),
            computations: self.computations.load(Ordering::Relaxed),
            vector_failures: self.vector_failures.load(Ordering::Relaxed),
            api_calls: self.api_calls.load(Ordering::Relaxed),
            api_failures: self.api_failures.load(Ordering::Relaxed),
            api_skipped: self.api_skipped.load(Ordering::Relaxed),
            unfiltered_fallbacks: self.unfiltered_fallbacks.load(Ordering::Relaxed),
            last_known_fallbacks: self.last_known_fallbacks.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
            index_upserts: self.index_upserts.load(Ordering::Relaxed),
            index_upsert_failures: self.index_upsert_failures.load(Ordering::Relaxed),
        }
    }
}

/// Everything the orchestrator can report
#[derive(Debug, Clone, Serialize)]
pub struct OrchestratorStats {
    /// Pipeline counters
    pub retrieval: RetrievalStats,
    /// Result cache
    pub result_cache: CacheStats,
    /// Embedding cache
    pub embedding_cache: CacheStats,
    /// Embedding provider calls
    pub embedding_calls: u64,
    /// Coalescing and lock activity
    pub single_flight: SingleFlightStats,
    /// Hotel API breaker
    pub breaker: CircuitBreakerMetrics,
    /// Hotel API pacing
    pub rate_limiter: RateLimiterStats,
}

struct OrchestratorInner {
    settings: RetrievalSettings,
    embedder: CachedEmbedder,
    index: Arc<dyn VectorIndex>,
    hotel_api: Option<Arc<dyn HotelSearchApi>>,
    cache: TieredCache<RetrievalResult>,
    flights: SingleFlightCoordinator<RetrievalResult>,
    breaker: CircuitBreaker,
    limiter: RateLimiter,
    stats: AtomicRetrievalStats,
}

/// Query to hotels, through cache, single-flight and fallbacks
#[derive(Clone)]
pub struct RetrievalOrchestrator {
    inner: Arc<OrchestratorInner>,
}

impl std::fmt::Debug for RetrievalOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalOrchestrator")
            .field("settings", &self.inner.settings)
            .field("index", &self.inner.index.backend())
            .field("distributed", &self.inner.flights.is_distributed())
            .finish()
    }
}

impl RetrievalOrchestrator {
    /// Assemble from prebuilt components
    pub fn new(settings: RetrievalSettings, components: RetrievalComponents) -> Self {
        Self {
            inner: Arc::new(OrchestratorInner {
                settings,
                embedder: components.embedder,
                index: components.index,
                hotel_api: components.hotel_api,
                cache: components.cache,
                flights: components.flights,
                breaker: components.breaker,
                limiter: components.limiter,
                stats: AtomicRetrievalStats::default(),
            }),
        }
    }

    /// Build caches, lock, breaker and limiter from configuration
    pub fn from_config(config: &Config, deps: RetrievalDeps) -> Result<Self> {
        let cache = TieredCache::new(
            RESULT_NAMESPACE,
            CacheSettings::from_config(&config.cache),
            deps.durable.clone(),
        )?;

        let embedding_cache = TieredCache::new(
            EMBEDDING_NAMESPACE,
            CacheSettings {
                fresh: Duration::from_millis(config.cache.embedding_fresh_ms),
                stale: Duration::ZERO,
                max_size: config.cache.embedding_max_size,
                durable_timeout: Duration::from_millis(config.cache.durable_timeout_ms),
            },
            deps.durable.clone(),
        )?;

        let lock = match (&deps.durable, config.lock.enabled) {
            (Some(store), true) => Some(DistributedLock::new(
                Arc::clone(store),
                LOCK_PREFIX,
                Duration::from_millis(config.lock.ttl_ms),
                Duration::from_millis(config.cache.durable_timeout_ms),
            )),
            _ => None,
        };
        let policy = WaitPolicy {
            wait_timeout: Duration::from_millis(config.lock.wait_ms),
            poll_interval: Duration::from_millis(config.lock.poll_ms),
        };

        let settings = RetrievalSettings::from_config(&config.retrieval);
        let embedder = CachedEmbedder::new(deps.embedder, embedding_cache, settings.embedding_timeout);
        let breaker = CircuitBreaker::new(
            "hotel_api",
            CircuitBreakerConfig {
                failure_threshold: config.circuit_breaker.failure_threshold,
                reset_timeout: Duration::from_millis(config.circuit_breaker.reset_timeout_ms),
            },
        );

        info!(
            "Retrieval pipeline ready (durable tier: {}, distributed lock: {})",
            deps.durable.is_some(),
            lock.is_some()
        );

        Ok(Self::new(
            settings,
            RetrievalComponents {
                embedder,
                index: deps.index,
                hotel_api: deps.hotel_api,
                cache,
                flights: SingleFlightCoordinator::new(lock, policy),
                breaker,
                limiter: RateLimiter::from_config(&config.rate_limit),
            },
        ))
    }

    /// Hotels for `text`, at most `top_k` (or the configured default).
    ///
    /// Fails only with `ExhaustedFallback` (or `Validation` for an empty query).
    pub async fn retrieve(&self, text: &str, top_k: Option<usize>) -> Result<RetrievalResponse> {
        let query = RetrievalQuery::new(text, top_k.unwrap_or(self.inner.settings.default_top_k));
        if query.normalized.is_empty() {
            return Err(TravelError::validation("query text is empty"));
        }
        AtomicRetrievalStats::bump(&self.inner.stats.requests);

        let key = query.cache_key();
        let lookup = self.inner.cache.get(&key).await;
        match (lookup.status, lookup.value) {
            (CacheStatus::Fresh, Some(result)) => {
                debug!("Serving fresh result for {}", key);
                return Ok(RetrievalResponse {
                    result,
                    served_from: ServedFrom::CacheFresh,
                });
            }
            (CacheStatus::Stale, Some(result)) => {
                debug!("Serving stale result for {}, refreshing", key);
                self.revalidate(&key, result.retrieval_query());
                return Ok(RetrievalResponse {
                    result,
                    served_from: ServedFrom::CacheStale,
                });
            }
            _ => {}
        }

        let result = self.compute_shared(query).await?;
        Ok(RetrievalResponse {
            result,
            served_from: ServedFrom::Computed,
        })
    }

    /// Refresh `key` on a detached task, keyed by the original query text.
    ///
    /// Fallback-quality results are not written over the stale entry, and a
    /// result another process already stored is not written again.
    fn revalidate(&self, key: &str, query: RetrievalQuery) {
        let this = self.clone();
        self.inner.cache.refresh_in_background(key, move || async move {
            let result = this.compute_shared(query).await?;
            if result.source.is_authoritative() {
                Ok(())
            } else {
                Err(TravelError::dependency(
                    "retrieval",
                    "refresh produced only fallback data",
                ))
            }
        });
    }

    /// Run the pipeline once per key across concurrent callers.
    ///
    /// Authoritative results are stored before the lock is released. Waiters
    /// on another process accept only a fresh entry, never the stale one that
    /// may have sent them here.
    async fn compute_shared(&self, query: RetrievalQuery) -> Result<RetrievalResult> {
        let key = query.cache_key();
        let this = self.clone();
        let persist_key = key.clone();
        let poll_cache = self.inner.cache.clone();
        let poll_key = key.clone();

        self.inner
            .flights
            .run(
                &key,
                move || async move {
                    let result = this.compute(query).await?;
                    if result.source.is_authoritative() {
                        this.inner.cache.set(&persist_key, result.clone()).await;
                    }
                    Ok(result)
                },
                move || {
                    let cache = poll_cache.clone();
                    let key = poll_key.clone();
                    async move {
                        let lookup = cache.get(&key).await;
                        match lookup.status {
                            CacheStatus::Fresh => lookup.value,
                            _ => None,
                        }
                    }
                },
            )
            .await
    }

    async fn compute(&self, query: RetrievalQuery) -> Result<RetrievalResult> {
        AtomicRetrievalStats::bump(&self.inner.stats.computations);
        let destination = extract_destination(&query.text);

        let candidates = match self.vector_candidates(&query).await {
            Ok(candidates) => candidates,
            Err(e) => {
                AtomicRetrievalStats::bump(&self.inner.stats.vector_failures);
                warn!("Vector retrieval failed for '{}': {}", query.normalized, e);
                return self.fallback(&query, destination, Vec::new()).await;
            }
        };

        let Some(target) = destination.as_deref() else {
            return Ok(self.finish(&query, candidates, RetrievalSource::VectorIndex, None));
        };

        let local = filter_by_location(&candidates, target);
        if local.is_empty() {
            debug!(
                "{} candidates, none in {}; trying the hotel API",
                candidates.len(),
                target
            );
            return self.fallback(&query, destination, candidates).await;
        }

        Ok(self.finish(&query, local, RetrievalSource::VectorIndex, destination))
    }

    async fn vector_candidates(&self, query: &RetrievalQuery) -> Result<Vec<HotelItem>> {
        let vector = self.inner.embedder.embed(&query.normalized).await?;

        let index = Arc::clone(&self.inner.index);
        let limit = query.top_k * self.inner.settings.candidate_multiplier;
        let matches = with_timeout(
            async move { index.query(&vector, limit, true).await },
            self.inner.settings.vector_timeout,
            "vector_query",
        )
        .await?;

        Ok(matches.iter().filter_map(HotelItem::from_match).collect())
    }

    /// Hotel API, then unfiltered candidates, then any earlier result
    async fn fallback(
        &self,
        query: &RetrievalQuery,
        destination: Option<String>,
        unfiltered: Vec<HotelItem>,
    ) -> Result<RetrievalResult> {
        let mut api_answered_empty = false;

        if let Some(target) = destination.as_deref() {
            match self.search_external(target, query.top_k).await {
                Ok(items) if !items.is_empty() => {
                    if self.inner.settings.index_api_results {
                        self.index_in_background(items.clone());
                    }
                    return Ok(self.finish(query, items, RetrievalSource::ExternalApi, destination));
                }
                Ok(_) => {
                    debug!("Hotel API has no hotels for {}", target);
                    api_answered_empty = true;
                }
                Err(e) => warn!("Hotel API fallback failed for {}: {}", target, e),
            }
        }

        if !unfiltered.is_empty() {
            AtomicRetrievalStats::bump(&self.inner.stats.unfiltered_fallbacks);
            return Ok(self.finish(
                query,
                unfiltered,
                RetrievalSource::UnfilteredVector,
                destination,
            ));
        }

        if let Some(mut previous) = self.inner.cache.get_any(&query.cache_key()) {
            AtomicRetrievalStats::bump(&self.inner.stats.last_known_fallbacks);
            info!("Serving last known result for '{}'", query.normalized);
            previous.source = RetrievalSource::LastKnown;
            return Ok(previous);
        }

        if api_answered_empty {
            return Ok(self.finish(query, Vec::new(), RetrievalSource::ExternalApi, destination));
        }

        AtomicRetrievalStats::bump(&self.inner.stats.exhausted);
        error!("No data source could answer '{}'", query.normalized);
        Err(TravelError::exhausted(format!(
            "no data source could answer '{}'",
            query.normalized
        )))
    }

    /// Hotel API behind breaker, limiter and deadline
    async fn search_external(&self, destination: &str, limit: usize) -> Result<Vec<HotelItem>> {
        let Some(api) = self.inner.hotel_api.clone() else {
            return Err(TravelError::dependency(
                "hotel_api",
                "no hotel API configured",
            ));
        };

        if self.inner.breaker.is_open() {
            AtomicRetrievalStats::bump(&self.inner.stats.api_skipped);
            debug!("Hotel API breaker open, skipping {}", destination);
            return Err(TravelError::CircuitOpen(self.inner.breaker.name().to_string()));
        }

        AtomicRetrievalStats::bump(&self.inner.stats.api_calls);
        let timeout = self.inner.settings.api_timeout;
        let target = destination.to_string();
        let attempt = self.inner.limiter.schedule(move || async move {
            with_timeout(
                async move { api.search_by_destination(&target, limit).await },
                timeout,
                "hotel_api",
            )
            .await
        });

        let outcome = self.inner.breaker.call(attempt).await;
        if outcome.is_err() {
            AtomicRetrievalStats::bump(&self.inner.stats.api_failures);
        }
        outcome
    }

    /// Embed and upsert hotel API results so later queries find them locally
    fn index_in_background(&self, items: Vec<HotelItem>) {
        let this = self.clone();
        tokio::spawn(async move {
            let embeddings = futures::future::join_all(
                items.iter().map(|item| {
                    let embedder = &this.inner.embedder;
                    let text = item.embedding_text();
                    async move { embedder.embed_uncached(&text).await }
                }),
            )
            .await;

            let points: Vec<VectorPoint> = items
                .iter()
                .zip(embeddings)
                .filter_map(|(item, embedding)| match embedding {
                    Ok(vector) => Some(VectorPoint::new(item.id.clone(), vector, item.to_metadata())),
                    Err(e) => {
                        debug!("Skipping index of {}: {}", item.id, e);
                        None
                    }
                })
                .collect();
            if points.is_empty() {
                return;
            }

            let count = points.len();
            let index = Arc::clone(&this.inner.index);
            let upsert = with_timeout(
                async move { index.upsert(points).await },
                this.inner.settings.vector_timeout,
                "vector_upsert",
            )
            .await;

            match upsert {
                Ok(()) => {
                    AtomicRetrievalStats::bump(&this.inner.stats.index_upserts);
                    debug!("Indexed {} hotels from the hotel API", count);
                }
                Err(e) => {
                    AtomicRetrievalStats::bump(&this.inner.stats.index_upsert_failures);
                    warn!("Indexing hotel API results failed: {}", e);
                }
            }
        });
    }

    fn finish(
        &self,
        query: &RetrievalQuery,
        hotels: Vec<HotelItem>,
        source: RetrievalSource,
        destination: Option<String>,
    ) -> RetrievalResult {
        RetrievalResult {
            query: query.text.clone(),
            top_k: query.top_k,
            hotels: hotels.into_iter().take(query.top_k).collect(),
            source,
            destination,
            generated_at_ms: now_ms(),
        }
    }

    /// Result cache, for inspection and warm-up
    pub fn cache(&self) -> &TieredCache<RetrievalResult> {
        &self.inner.cache
    }

    /// Hotel API breaker
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.inner.breaker
    }

    /// Configured deadlines and sizing
    pub fn settings(&self) -> &RetrievalSettings {
        &self.inner.settings
    }

    /// Snapshot of every component's counters
    pub fn stats(&self) -> OrchestratorStats {
        OrchestratorStats {
            retrieval: self.inner.stats.snapshot(),
            result_cache: self.inner.cache.stats(),
            embedding_cache: self.inner.embedder.cache().stats(),
            embedding_calls: self.inner.embedder.provider_calls(),
            single_flight: self.inner.flights.stats(),
            breaker: self.inner.breaker.metrics(),
            rate_limiter: self.inner.limiter.stats(),
        }
    }
}
