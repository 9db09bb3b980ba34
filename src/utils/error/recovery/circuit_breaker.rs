//! Circuit breaker implementation for fault tolerance

use super::types::{CircuitBreakerConfig, CircuitBreakerMetrics, CircuitState};
use crate::utils::error::{Result, TravelError};
use parking_lot::Mutex;
use std::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct BreakerState {
    failure_count: u32,
    open_until: Option<Instant>,
    times_opened: u64,
}

/// Consecutive-failure circuit breaker guarding one external dependency.
///
/// There is no separate probing phase: once the cooldown passes the next caller
/// may try again, and its outcome decides. A failed trial reopens the circuit
/// for a full `reset_timeout` because the failure count is still at or above the
/// threshold.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            state: Mutex::new(BreakerState::default()),
        }
    }

    /// Whether calls must currently be skipped
    pub fn is_open(&self) -> bool {
        let state = self.state.lock();
        matches!(state.open_until, Some(until) if Instant::now() < until)
    }

    /// Count a failed call, opening the circuit once the threshold is reached
    pub fn record_failure(&self) {
        let mut state = self.state.lock();
        state.failure_count = state.failure_count.saturating_add(1);

        if state.failure_count >= self.config.failure_threshold {
            state.open_until = Some(Instant::now() + self.config.reset_timeout);
            state.times_opened += 1;
            warn!(
                breaker = %self.name,
                failures = state.failure_count,
                cooldown_ms = self.config.reset_timeout.as_millis() as u64,
                "Circuit breaker opened"
            );
        } else {
            debug!(
                breaker = %self.name,
                failures = state.failure_count,
                threshold = self.config.failure_threshold,
                "Circuit breaker recorded failure"
            );
        }
    }

    /// Reset the failure count and close the circuit
    pub fn record_success(&self) {
        let mut state = self.state.lock();
        if state.failure_count > 0 || state.open_until.is_some() {
            debug!(breaker = %self.name, "Circuit breaker closed after success");
        }
        state.failure_count = 0;
        state.open_until = None;
    }

    /// Execute a future with circuit breaker protection
    pub async fn call<F, T>(&self, f: F) -> Result<T>
    where
        F: std::future::Future<Output = Result<T>>,
    {
        if self.is_open() {
            return Err(TravelError::CircuitOpen(self.name.clone()));
        }

        match f.await {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(error) => {
                self.record_failure();
                Err(error)
            }
        }
    }

    /// Get current circuit breaker state
    pub fn state(&self) -> CircuitState {
        let state = self.state.lock();
        match state.open_until {
            Some(until) if Instant::now() < until => CircuitState::Open,
            Some(_) => CircuitState::HalfOpen,
            None => CircuitState::Closed,
        }
    }

    /// Get current metrics
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let current = self.state();
        let state = self.state.lock();
        CircuitBreakerMetrics {
            name: self.name.clone(),
            state: current,
            failure_count: state.failure_count,
            times_opened: state.times_opened,
            open_for: state
                .open_until
                .and_then(|until| until.checked_duration_since(Instant::now())),
        }
    }

    /// Force the breaker back to closed
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.failure_count = 0;
        state.open_until = None;
        debug!(breaker = %self.name, "Circuit breaker reset");
    }

    /// Name of the guarded dependency
    pub fn name(&self) -> &str {
        &self.name
    }
}
