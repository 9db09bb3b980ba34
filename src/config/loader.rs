//! Configuration loading from environment variables
//!
//! Every override is optional; unset variables keep the file or default value.

use super::Config;
use crate::utils::error::{Result, TravelError};
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use tracing::debug;

/// Parse variable `name` from `lookup`, `None` when unset
fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| TravelError::Config(format!("Invalid {}: {}", name, e))),
        None => Ok(None),
    }
}

/// Assign `$target` when variable `$name` is set
macro_rules! override_from {
    ($lookup:expr, $name:literal, $target:expr) => {
        if let Some(value) = parse_var($lookup, $name)? {
            $target = value;
        }
    };
}

impl Config {
    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|name| env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable source
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        debug!("Applying configuration overrides from environment");
        let lookup = &lookup;

        // Retrieval
        override_from!(lookup, "EMBEDDING_TIMEOUT_MS", self.retrieval.embedding_timeout_ms);
        override_from!(lookup, "VECTOR_QUERY_TIMEOUT_MS", self.retrieval.vector_query_timeout_ms);
        override_from!(lookup, "HOTEL_API_TIMEOUT_MS", self.retrieval.hotel_api_timeout_ms);
        override_from!(lookup, "RETRIEVAL_TOP_K", self.retrieval.default_top_k);
        override_from!(lookup, "RETRIEVAL_CANDIDATE_MULTIPLIER", self.retrieval.candidate_multiplier);
        override_from!(lookup, "INDEX_API_RESULTS", self.retrieval.index_api_results);

        // Circuit breaker and rate limit
        override_from!(lookup, "HOTEL_API_FAILURE_THRESHOLD", self.circuit_breaker.failure_threshold);
        override_from!(lookup, "HOTEL_API_RESET_MS", self.circuit_breaker.reset_timeout_ms);
        override_from!(lookup, "HOTEL_API_MAX_REQUESTS", self.rate_limit.max_requests);
        override_from!(lookup, "HOTEL_API_WINDOW_MS", self.rate_limit.window_ms);

        // Cache
        override_from!(lookup, "CACHE_FRESH_MS", self.cache.fresh_ms);
        override_from!(lookup, "CACHE_STALE_MS", self.cache.stale_ms);
        override_from!(lookup, "CACHE_MAX_SIZE", self.cache.max_size);
        override_from!(lookup, "CACHE_DURABLE_TIMEOUT_MS", self.cache.durable_timeout_ms);
        override_from!(lookup, "EMBEDDING_CACHE_FRESH_MS", self.cache.embedding_fresh_ms);
        override_from!(lookup, "EMBEDDING_CACHE_MAX_SIZE", self.cache.embedding_max_size);

        // Lock
        override_from!(lookup, "LOCK_ENABLED", self.lock.enabled);
        override_from!(lookup, "LOCK_TTL_MS", self.lock.ttl_ms);
        override_from!(lookup, "LOCK_WAIT_MS", self.lock.wait_ms);
        override_from!(lookup, "LOCK_POLL_MS", self.lock.poll_ms);

        // Storage
        override_from!(lookup, "REDIS_URL", self.storage.redis.url);
        override_from!(lookup, "REDIS_ENABLED", self.storage.redis.enabled);
        override_from!(lookup, "QDRANT_URL", self.storage.vector.url);
        override_from!(lookup, "QDRANT_COLLECTION", self.storage.vector.collection);
        override_from!(lookup, "QDRANT_VECTOR_SIZE", self.storage.vector.vector_size);
        if let Some(key) = lookup("QDRANT_API_KEY") {
            self.storage.vector.api_key = Some(key);
        }

        // Providers
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.providers.embedding.api_key = Some(key.clone());
            self.providers.completion.api_key = Some(key);
        }
        if let Some(base_url) = lookup("OPENAI_BASE_URL") {
            self.providers.embedding.base_url = base_url.clone();
            self.providers.completion.base_url = base_url;
        }
        override_from!(lookup, "EMBEDDING_MODEL", self.providers.embedding.model);
        override_from!(lookup, "COMPLETION_MODEL", self.providers.completion.model);
        if let Some(base_url) = lookup("HOTEL_API_BASE_URL") {
            self.providers.hotel_api.base_url = Some(base_url);
        }
        if let Some(key) = lookup("HOTEL_API_KEY") {
            self.providers.hotel_api.api_key = Some(key);
        }

        // Chat
        override_from!(lookup, "CHAT_MAX_TURNS", self.chat.max_turns);
        override_from!(lookup, "SESSION_TTL_MS", self.chat.session_ttl_ms);
        override_from!(lookup, "COMPLETION_TIMEOUT_MS", self.chat.completion_timeout_ms);

        // Logging
        override_from!(lookup, "LOG_LEVEL", self.logging.level);
        override_from!(lookup, "LOG_JSON", self.logging.json);

        Ok(())
    }
}
