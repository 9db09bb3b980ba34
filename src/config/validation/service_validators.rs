//! Provider, chat and logging validators

use super::non_zero;
use super::trait_def::Validate;
use crate::config::models::*;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

fn validate_base_url(url: &str, what: &str) -> Result<(), String> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(format!("{} base URL must start with http:// or https://", what));
    }
    Ok(())
}

impl Validate for ProvidersConfig {
    fn validate(&self) -> Result<(), String> {
        validate_base_url(&self.embedding.base_url, "Embedding provider")?;
        validate_base_url(&self.completion.base_url, "Completion provider")?;
        if let Some(url) = &self.hotel_api.base_url {
            validate_base_url(url, "Hotel API")?;
        }

        if self.embedding.model.trim().is_empty() {
            return Err("Embedding model cannot be empty".to_string());
        }
        if self.completion.model.trim().is_empty() {
            return Err("Completion model cannot be empty".to_string());
        }
        if !(0.0..=2.0).contains(&self.completion.temperature) {
            return Err("Completion temperature must be between 0.0 and 2.0".to_string());
        }
        non_zero(self.completion.max_tokens, "Completion max tokens")?;

        Ok(())
    }
}

impl Validate for ChatConfig {
    fn validate(&self) -> Result<(), String> {
        non_zero(self.max_turns, "Chat max turns")?;
        non_zero(self.session_ttl_ms, "Session TTL")?;
        non_zero(self.completion_timeout_ms, "Completion timeout")?;
        non_zero(self.prune_interval_ms, "Session prune interval")?;
        Ok(())
    }
}

impl Validate for LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let level = self.level.trim().to_lowercase();
        // Full filter directives such as "travel_rag=debug" are passed through
        if level.contains('=') || LOG_LEVELS.contains(&level.as_str()) {
            return Ok(());
        }
        Err(format!("Unknown log level: {}", self.level))
    }
}
