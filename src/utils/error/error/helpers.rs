//! Helper functions for creating and classifying errors

use super::types::TravelError;

impl TravelError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn timeout<S: Into<String>>(label: S, after_ms: u64) -> Self {
        Self::Timeout {
            label: label.into(),
            after_ms,
        }
    }

    pub fn dependency<D: Into<String>, S: Into<String>>(dependency: D, message: S) -> Self {
        Self::Dependency {
            dependency: dependency.into(),
            message: message.into(),
        }
    }

    pub fn cache_unavailable<S: Into<String>>(message: S) -> Self {
        Self::CacheUnavailable(message.into())
    }

    pub fn exhausted<S: Into<String>>(message: S) -> Self {
        Self::ExhaustedFallback(message.into())
    }

    pub fn vector_db<S: Into<String>>(message: S) -> Self {
        Self::VectorDb(message.into())
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// True for deadline expiry, regardless of message
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// True when the only remaining option is a degraded response
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::ExhaustedFallback(_))
    }

    /// Errors a caller may recover from by trying a cheaper or cached path
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::Dependency { .. }
                | Self::CacheUnavailable(_)
                | Self::CircuitOpen(_)
                | Self::RateLimit(_)
                | Self::Redis(_)
                | Self::HttpClient(_)
                | Self::VectorDb(_)
        )
    }
}
