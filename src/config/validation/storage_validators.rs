//! Storage configuration validators

use super::non_zero;
use super::trait_def::Validate;
use crate::config::models::*;
use tracing::debug;

impl Validate for StorageConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating storage configuration");

        self.redis.validate()?;
        self.vector.validate()?;

        Ok(())
    }
}

impl Validate for RedisConfig {
    fn validate(&self) -> Result<(), String> {
        if !self.enabled {
            return Ok(());
        }

        if self.url.is_empty() {
            return Err("Redis URL cannot be empty".to_string());
        }

        if !self.url.starts_with("redis://") && !self.url.starts_with("rediss://") {
            return Err("Redis URL must start with redis:// or rediss://".to_string());
        }

        non_zero(self.connection_timeout_ms, "Redis connection timeout")?;
        Ok(())
    }
}

impl Validate for VectorDbConfig {
    fn validate(&self) -> Result<(), String> {
        if self.url.is_empty() {
            return Err("Vector DB URL cannot be empty".to_string());
        }

        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err("Vector DB URL must start with http:// or https://".to_string());
        }

        if self.collection.trim().is_empty() {
            return Err("Vector DB collection cannot be empty".to_string());
        }

        non_zero(self.vector_size, "Vector size")?;
        non_zero(self.request_timeout_ms, "Vector DB request timeout")?;
        Ok(())
    }
}
