//! Error recovery and resilience utilities
//!
//! This module provides the circuit breaker and timeout guard used around
//! every external call.

mod circuit_breaker;
mod resilience;
mod types;


pub use circuit_breaker::CircuitBreaker;
pub use resilience::{TimeoutGuard, with_timeout};
pub use types::{CircuitBreakerConfig, CircuitBreakerMetrics, CircuitState};
