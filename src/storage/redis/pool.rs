//! Redis connection pool and core connection management
//!
//! This module provides Redis connectivity and health checks.

use crate::config::RedisConfig;
use crate::utils::error::{Result, TravelError};
use redis::{Client, aio::MultiplexedConnection};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Redis connection pool (supports no-op mode when Redis is unavailable)
#[derive(Clone)]
pub struct RedisPool {
    /// Multiplexed connection (None in no-op mode)
    pub(crate) connection_manager: Option<MultiplexedConnection>,
    /// Whether this is a no-op pool (Redis unavailable)
    pub(crate) noop_mode: bool,
    /// Sanitized URL for logs
    pub(crate) display_url: String,
}

/// Redis connection wrapper
pub struct RedisConnection {
    pub(crate) conn: Option<MultiplexedConnection>,
}

impl RedisPool {
    /// Create a new Redis pool, failing if the server cannot be reached
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        let display_url = Self::sanitize_url(&config.url);
        info!("Creating Redis connection pool");
        debug!("Redis URL: {}", display_url);

        let client = Client::open(config.url.as_str())?;

        let connect_timeout = Duration::from_millis(config.connection_timeout_ms);
        let connection_manager =
            tokio::time::timeout(connect_timeout, client.get_multiplexed_async_connection())
                .await
                .map_err(|_| {
                    TravelError::cache_unavailable(format!(
                        "Redis connect to {} timed out after {}ms",
                        display_url, config.connection_timeout_ms
                    ))
                })??;

        info!("Redis connection pool created successfully");
        Ok(Self {
            connection_manager: Some(connection_manager),
            noop_mode: false,
            display_url,
        })
    }

    /// Connect, or fall back to a no-op pool when Redis is disabled or unreachable
    pub async fn connect_or_noop(config: &RedisConfig) -> Self {
        if !config.enabled {
            debug!("Redis disabled, using no-op pool");
            return Self::create_noop();
        }

        match Self::new(config).await {
            Ok(pool) => pool,
            Err(e) => {
                warn!("Redis connection failed, continuing without durable cache: {}", e);
                Self::create_noop()
            }
        }
    }

    /// Create a no-op Redis pool (for when Redis is unavailable)
    pub fn create_noop() -> Self {
        info!("Creating no-op Redis pool (Redis unavailable)");
        Self {
            connection_manager: None,
            noop_mode: true,
            display_url: String::new(),
        }
    }

    /// Check if this is a no-op pool
    pub fn is_noop(&self) -> bool {
        self.noop_mode
    }

    /// Get a connection from the pool
    pub async fn get_connection(&self) -> Result<RedisConnection> {
        Ok(RedisConnection {
            conn: self.connection_manager.clone(),
        })
    }

    /// Health check
    pub async fn health_check(&self) -> Result<()> {
        if self.noop_mode {
            debug!("Redis health check skipped (no-op mode)");
            return Err(TravelError::cache_unavailable("Redis is in no-op mode"));
        }

        debug!("Performing Redis health check");
        let mut conn = self.get_connection().await?;
        if let Some(ref mut c) = conn.conn {
            let _: String = redis::cmd("PING").query_async(c).await?;
        }

        debug!("Redis health check passed");
        Ok(())
    }

    /// Sanitize Redis URL for logging (hide password)
    pub(crate) fn sanitize_url(url: &str) -> String {
        if let Ok(parsed) = url::Url::parse(url) {
            let mut sanitized = parsed.clone();
            if sanitized.password().is_some() {
                let _ = sanitized.set_password(Some("***"));
            }
            sanitized.to_string()
        } else {
            "invalid_url".to_string()
        }
    }
}

impl std::fmt::Debug for RedisPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisPool")
            .field("url", &self.display_url)
            .field("noop_mode", &self.noop_mode)
            .finish()
    }
}
