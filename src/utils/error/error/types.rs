//! Error types for the retrieval backend

use thiserror::Error;

/// Result type alias used across the crate
pub type Result<T> = std::result::Result<T, TravelError>;

/// Main error type
///
/// Every payload is owned text so the error is `Clone`: a single-flight leader
/// hands the same failure to every caller that joined its computation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TravelError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// An operation exceeded its deadline
    #[error("Timeout: {label} exceeded {after_ms}ms")]
    Timeout {
        /// Operation label, e.g. `embedding`
        label: String,
        /// Deadline that elapsed
        after_ms: u64,
    },

    /// Hard failure of a collaborator (embedding provider, vector index, hotel API)
    #[error("Dependency '{dependency}' failed: {message}")]
    Dependency {
        /// Which collaborator failed
        dependency: String,
        /// Failure detail
        message: String,
    },

    /// Durable cache tier unreachable
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    /// Nothing could produce a result
    #[error("No data source available: {0}")]
    ExhaustedFallback(String),

    /// Circuit breaker refused the call
    #[error("Circuit breaker open: {0}")]
    CircuitOpen(String),

    /// Upstream signalled rate limiting (HTTP 429)
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    /// Redis errors
    #[error("Redis error: {0}")]
    Redis(String),

    /// HTTP client errors
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(String),

    /// Vector database errors
    #[error("Vector database error: {0}")]
    VectorDb(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}
