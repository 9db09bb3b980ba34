//! Retrieval pipeline configuration

use super::*;
use serde::{Deserialize, Serialize};

/// Deadlines and sizing of the retrieval pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_embedding_timeout_ms")]
    pub embedding_timeout_ms: u64,
    #[serde(default = "default_vector_query_timeout_ms")]
    pub vector_query_timeout_ms: u64,
    #[serde(default = "default_hotel_api_timeout_ms")]
    pub hotel_api_timeout_ms: u64,
    /// Items returned when the caller does not ask for a count
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,
    #[serde(default = "default_candidate_multiplier")]
    pub candidate_multiplier: usize,
    /// Write hotel API results back into the vector index
    #[serde(default = "default_true")]
    pub index_api_results: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            embedding_timeout_ms: default_embedding_timeout_ms(),
            vector_query_timeout_ms: default_vector_query_timeout_ms(),
            hotel_api_timeout_ms: default_hotel_api_timeout_ms(),
            default_top_k: default_top_k(),
            candidate_multiplier: default_candidate_multiplier(),
            index_api_results: true,
        }
    }
}

/// Cross-process lock around result computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    /// Use the durable store for a cross-process lock
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_lock_ttl_ms")]
    pub ttl_ms: u64,
    /// How long a contended caller polls before computing itself
    #[serde(default = "default_lock_wait_ms")]
    pub wait_ms: u64,
    #[serde(default = "default_lock_poll_ms")]
    pub poll_ms: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_ms: default_lock_ttl_ms(),
            wait_ms: default_lock_wait_ms(),
            poll_ms: default_lock_poll_ms(),
        }
    }
}

/// Circuit breaker in front of the hotel API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerSettings {
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "default_reset_timeout_ms")]
    pub reset_timeout_ms: u64,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            reset_timeout_ms: default_reset_timeout_ms(),
        }
    }
}
