//! Retrieval pipeline validators

use super::non_zero;
use super::trait_def::Validate;
use crate::config::models::*;

impl Validate for RetrievalConfig {
    fn validate(&self) -> Result<(), String> {
        non_zero(self.embedding_timeout_ms, "Embedding timeout")?;
        non_zero(self.vector_query_timeout_ms, "Vector query timeout")?;
        non_zero(self.hotel_api_timeout_ms, "Hotel API timeout")?;
        non_zero(self.default_top_k, "Default top_k")?;
        non_zero(self.candidate_multiplier, "Candidate multiplier")?;

        if self.default_top_k > 100 {
            return Err("Default top_k should not exceed 100".to_string());
        }

        Ok(())
    }
}

impl Validate for CacheConfig {
    fn validate(&self) -> Result<(), String> {
        non_zero(self.fresh_ms, "Cache fresh window")?;
        non_zero(self.max_size, "Cache max size")?;
        non_zero(self.durable_timeout_ms, "Durable operation timeout")?;
        non_zero(self.embedding_fresh_ms, "Embedding cache fresh window")?;
        non_zero(self.embedding_max_size, "Embedding cache max size")?;
        Ok(())
    }
}

impl Validate for LockConfig {
    fn validate(&self) -> Result<(), String> {
        if !self.enabled {
            return Ok(());
        }

        non_zero(self.ttl_ms, "Lock TTL")?;
        non_zero(self.wait_ms, "Lock wait timeout")?;
        non_zero(self.poll_ms, "Lock poll interval")?;

        if self.poll_ms >= self.wait_ms {
            return Err(format!(
                "Lock poll interval ({}ms) must be shorter than the wait timeout ({}ms)",
                self.poll_ms, self.wait_ms
            ));
        }

        Ok(())
    }
}

impl Validate for CircuitBreakerSettings {
    fn validate(&self) -> Result<(), String> {
        non_zero(self.failure_threshold, "Circuit breaker failure threshold")?;
        non_zero(self.reset_timeout_ms, "Circuit breaker reset timeout")?;
        Ok(())
    }
}

impl Validate for RateLimitConfig {
    fn validate(&self) -> Result<(), String> {
        non_zero(self.max_requests, "Rate limit max requests")?;
        non_zero(self.window_ms, "Rate limit window")?;
        Ok(())
    }
}
