//! Conversation and logging configuration

use super::*;
use serde::{Deserialize, Serialize};

/// Conversation layer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Turns kept per session, oldest dropped first
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
    /// Idle time after which a session is forgotten
    #[serde(default = "default_session_ttl_ms")]
    pub session_ttl_ms: u64,
    #[serde(default = "default_completion_timeout_ms")]
    pub completion_timeout_ms: u64,
    #[serde(default = "default_prune_interval_ms")]
    pub prune_interval_ms: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            session_ttl_ms: default_session_ttl_ms(),
            completion_timeout_ms: default_completion_timeout_ms(),
            prune_interval_ms: default_prune_interval_ms(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
