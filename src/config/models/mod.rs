//! Configuration data models
//!
//! This module defines all configuration structures used by the backend.

#![allow(missing_docs)]

pub mod cache;
pub mod chat;
pub mod provider;
pub mod rate_limit;
pub mod retrieval;
pub mod storage;

// Re-export all configuration types
pub use cache::*;
pub use chat::*;
pub use provider::*;
pub use rate_limit::*;
pub use retrieval::*;
pub use storage::*;

/// Embedding call deadline in milliseconds
pub fn default_embedding_timeout_ms() -> u64 {
    3_000
}

/// Vector index query deadline in milliseconds
pub fn default_vector_query_timeout_ms() -> u64 {
    1_500
}

/// Hotel API call deadline in milliseconds
pub fn default_hotel_api_timeout_ms() -> u64 {
    5_000
}

pub fn default_top_k() -> usize {
    5
}

/// Vector candidates fetched per wanted item, before the locality filter
pub fn default_candidate_multiplier() -> usize {
    3
}

pub fn default_true() -> bool {
    true
}

/// Result fresh window: 10 minutes
pub fn default_cache_fresh_ms() -> u64 {
    600_000
}

/// Result stale window: 30 minutes
pub fn default_cache_stale_ms() -> u64 {
    1_800_000
}

pub fn default_cache_max_size() -> usize {
    500
}

/// Deadline for each durable tier operation
pub fn default_durable_timeout_ms() -> u64 {
    500
}

/// Embeddings are stable: 30 days
pub fn default_embedding_fresh_ms() -> u64 {
    30 * 24 * 60 * 60 * 1_000
}

pub fn default_embedding_max_size() -> usize {
    2_000
}

pub fn default_lock_ttl_ms() -> u64 {
    10_000
}

pub fn default_lock_wait_ms() -> u64 {
    4_000
}

pub fn default_lock_poll_ms() -> u64 {
    150
}

pub fn default_failure_threshold() -> u32 {
    3
}

pub fn default_reset_timeout_ms() -> u64 {
    60_000
}

pub fn default_max_requests() -> usize {
    5
}

pub fn default_window_ms() -> u64 {
    1_000
}

pub fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

pub fn default_connection_timeout_ms() -> u64 {
    2_000
}

pub fn default_qdrant_url() -> String {
    "http://127.0.0.1:6333".to_string()
}

pub fn default_collection() -> String {
    "hotels".to_string()
}

/// Dimension of `text-embedding-3-small`
pub fn default_vector_size() -> usize {
    1_536
}

pub fn default_request_timeout_ms() -> u64 {
    10_000
}

pub fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

pub fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

pub fn default_completion_model() -> String {
    "gpt-4o-mini".to_string()
}

pub fn default_temperature() -> f32 {
    0.7
}

pub fn default_max_tokens() -> u32 {
    600
}

pub fn default_max_turns() -> usize {
    20
}

/// Idle conversations expire after 30 minutes
pub fn default_session_ttl_ms() -> u64 {
    1_800_000
}

pub fn default_completion_timeout_ms() -> u64 {
    8_000
}

pub fn default_prune_interval_ms() -> u64 {
    60_000
}

pub fn default_log_level() -> String {
    "info".to_string()
}
