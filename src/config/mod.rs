//! Configuration management for the retrieval backend
//!
//! This module handles loading, validation, and management of all configuration.
//! Sources are layered: defaults, then an optional YAML file, then environment.

mod loader;
pub mod models;
pub mod validation;

pub use models::*;
pub use validation::Validate;

use crate::storage::RedisPool;
use crate::utils::error::{Result, TravelError};
use crate::utils::logging::mask_secret;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub lock: LockConfig,
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerSettings,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| TravelError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| TravelError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Load configuration from defaults plus environment variables
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let mut config = Self::default();
        config.apply_env_overrides()?;

        config.validate()?;
        Ok(config)
    }

    /// File (when given) then environment overrides
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path).await?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");

        let sections: [(&str, &dyn Validate); 9] = [
            ("Retrieval", &self.retrieval),
            ("Cache", &self.cache),
            ("Lock", &self.lock),
            ("Circuit breaker", &self.circuit_breaker),
            ("Rate limit", &self.rate_limit),
            ("Storage", &self.storage),
            ("Providers", &self.providers),
            ("Chat", &self.chat),
            ("Logging", &self.logging),
        ];

        for (name, section) in sections {
            section
                .validate()
                .map_err(|e| TravelError::Config(format!("{} config error: {}", name, e)))?;
        }

        let worst_case_ms = self.retrieval.embedding_timeout_ms
            + self.retrieval.vector_query_timeout_ms
            + self.retrieval.hotel_api_timeout_ms;
        if self.lock.enabled && self.lock.ttl_ms < worst_case_ms {
            warn!(
                "Lock TTL {}ms is shorter than the slowest computation ({}ms)",
                self.lock.ttl_ms, worst_case_ms
            );
        }

        debug!("Configuration validation completed");
        Ok(())
    }

    /// Copy with every API key masked, for display
    pub fn redacted(&self) -> Self {
        let mask = |key: &Option<String>| key.as_deref().map(mask_secret);
        let mut config = self.clone();
        config.storage.vector.api_key = mask(&self.storage.vector.api_key);
        config.providers.embedding.api_key = mask(&self.providers.embedding.api_key);
        config.providers.hotel_api.api_key = mask(&self.providers.hotel_api.api_key);
        config.providers.completion.api_key = mask(&self.providers.completion.api_key);
        config.storage.redis.url = RedisPool::sanitize_url(&self.storage.redis.url);
        config
    }

    /// Convert to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| TravelError::Config(format!("Failed to serialize config to YAML: {}", e)))
    }
}

impl ChatConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_millis(self.session_ttl_ms)
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_millis(self.completion_timeout_ms)
    }

    pub fn prune_interval(&self) -> Duration {
        Duration::from_millis(self.prune_interval_ms)
    }
}
