//! Cache configuration

use super::*;
use serde::{Deserialize, Serialize};

/// Result and embedding cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Result fresh window
    #[serde(default = "default_cache_fresh_ms")]
    pub fresh_ms: u64,
    /// Result stale window, after `fresh_ms`
    #[serde(default = "default_cache_stale_ms")]
    pub stale_ms: u64,
    /// Local result entries before LRU eviction
    #[serde(default = "default_cache_max_size")]
    pub max_size: usize,
    /// Deadline for each durable tier operation
    #[serde(default = "default_durable_timeout_ms")]
    pub durable_timeout_ms: u64,
    #[serde(default = "default_embedding_fresh_ms")]
    pub embedding_fresh_ms: u64,
    #[serde(default = "default_embedding_max_size")]
    pub embedding_max_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            fresh_ms: default_cache_fresh_ms(),
            stale_ms: default_cache_stale_ms(),
            max_size: default_cache_max_size(),
            durable_timeout_ms: default_durable_timeout_ms(),
            embedding_fresh_ms: default_embedding_fresh_ms(),
            embedding_max_size: default_embedding_max_size(),
        }
    }
}
