//! Conversions from library errors into TravelError
//!
//! Library errors are flattened to their display text so `TravelError` stays `Clone`.

use super::types::TravelError;

impl From<redis::RedisError> for TravelError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_refusal() || err.is_connection_dropped() || err.is_io_error() {
            TravelError::CacheUnavailable(err.to_string())
        } else {
            TravelError::Redis(err.to_string())
        }
    }
}

impl From<reqwest::Error> for TravelError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return TravelError::Timeout {
                label: err
                    .url()
                    .map(|u| u.path().to_string())
                    .unwrap_or_else(|| "http".to_string()),
                after_ms: 0,
            };
        }
        if err.status().map(|s| s.as_u16()) == Some(429) {
            return TravelError::RateLimit(err.to_string());
        }
        TravelError::HttpClient(err.to_string())
    }
}

impl From<serde_json::Error> for TravelError {
    fn from(err: serde_json::Error) -> Self {
        TravelError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for TravelError {
    fn from(err: serde_yaml::Error) -> Self {
        TravelError::Config(format!("YAML error: {}", err))
    }
}

impl From<std::io::Error> for TravelError {
    fn from(err: std::io::Error) -> Self {
        TravelError::Io(err.to_string())
    }
}

impl From<tokio::task::JoinError> for TravelError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_panic() {
            TravelError::Internal(format!("Background task panicked: {}", err))
        } else {
            TravelError::Internal(format!("Background task cancelled: {}", err))
        }
    }
}
