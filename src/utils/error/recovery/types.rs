//! Types and configurations for error recovery patterns

use serde::Serialize;
use std::time::Duration;

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Calls proceed; failures are counted
    Closed,
    /// Calls are skipped until the cooldown ends
    Open,
    /// Cooldown elapsed with the threshold still reached: the next call is a trial
    HalfOpen,
}

/// Circuit breaker configuration
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit
    pub failure_threshold: u32,
    /// How long the circuit stays open
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            reset_timeout: Duration::from_secs(60),
        }
    }
}

/// Circuit breaker metrics
#[derive(Debug, Clone, Serialize)]
pub struct CircuitBreakerMetrics {
    /// Dependency this breaker guards
    pub name: String,
    /// Current circuit breaker state
    pub state: CircuitState,
    /// Number of consecutive failures
    pub failure_count: u32,
    /// How many times the circuit has opened
    pub times_opened: u64,
    /// Remaining cooldown, if open
    pub open_for: Option<Duration>,
}
