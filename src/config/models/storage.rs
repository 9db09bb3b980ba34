//! Storage configuration

use super::*;
use serde::{Deserialize, Serialize};

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Durable cache tier and lock store
    #[serde(default)]
    pub redis: RedisConfig,
    /// Vector index
    #[serde(default)]
    pub vector: VectorDbConfig,
}

/// Redis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// When false the backend runs with the local tier only
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            enabled: true,
            connection_timeout_ms: default_connection_timeout_ms(),
        }
    }
}

/// Qdrant configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorDbConfig {
    #[serde(default = "default_qdrant_url")]
    pub url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Must match the embedding model's dimension
    #[serde(default = "default_vector_size")]
    pub vector_size: usize,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            url: default_qdrant_url(),
            api_key: None,
            collection: default_collection(),
            vector_size: default_vector_size(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}
