//! Rate Limiting Implementation
//!
//! Bounds calls to a rate-limited upstream to N per time window, queuing the rest.

mod limiter;
mod types;


// Re-export public types
pub use limiter::RateLimiter;
pub use types::RateLimiterStats;
