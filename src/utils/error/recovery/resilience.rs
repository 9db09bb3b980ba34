//! Timeout protection for async operations

use crate::utils::error::{Result, TravelError};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Race `operation` against a deadline.
///
/// The operation runs as its own task, so when the deadline fires first it keeps
/// running to completion in the background and its outcome is dropped. Nothing
/// is retried here.
pub async fn with_timeout<F, T>(operation: F, timeout: Duration, label: &str) -> Result<T>
where
    F: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    let handle = tokio::spawn(operation);

    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(join_error)) => Err(join_error.into()),
        Err(_) => {
            debug!(
                label,
                timeout_ms = timeout.as_millis() as u64,
                "Operation timed out, leaving it detached"
            );
            Err(TravelError::timeout(label, timeout.as_millis() as u64))
        }
    }
}

/// Reusable deadline for one kind of operation
#[derive(Debug, Clone)]
pub struct TimeoutGuard {
    timeout: Duration,
    label: String,
}

impl TimeoutGuard {
    /// Create a new timeout guard
    pub fn new(label: impl Into<String>, timeout: Duration) -> Self {
        Self {
            timeout,
            label: label.into(),
        }
    }

    /// Execute a future with timeout protection
    pub async fn run<F, T>(&self, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        with_timeout(operation, self.timeout, &self.label).await
    }

    /// Configured deadline
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Operation label used in timeout errors
    pub fn label(&self) -> &str {
        &self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Instant;

    #[tokio::test]
    async fn test_timeout_guard_success() {
        let guard = TimeoutGuard::new("fast", Duration::from_secs(1));
        let result = guard.run(async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_error_propagates_unchanged() {
        let result: Result<()> = with_timeout(
            async { Err(TravelError::dependency("vector_index", "HTTP 500")) },
            Duration::from_secs(1),
            "vector_query",
        )
        .await;
        assert_eq!(
            result.unwrap_err(),
            TravelError::dependency("vector_index", "HTTP 500")
        );
    }

    #[tokio::test]
    async fn test_never_settling_operation_times_out() {
        let started = Instant::now();
        let result: Result<()> = with_timeout(
            std::future::pending::<Result<()>>(),
            Duration::from_millis(50),
            "embedding",
        )
        .await;

        assert!(started.elapsed() >= Duration::from_millis(50));
        match result {
            Err(TravelError::Timeout { label, after_ms }) => {
                assert_eq!(label, "embedding");
                assert_eq!(after_ms, 50);
            }
            other => panic!("Expected Timeout error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_late_settlement_is_not_observed_but_still_runs() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();

        let result = with_timeout(
            async move {
                tokio::time::sleep(Duration::from_millis(80)).await;
                flag.store(true, Ordering::SeqCst);
                Ok("late")
            },
            Duration::from_millis(20),
            "slow",
        )
        .await;
        assert!(result.unwrap_err().is_timeout());

        // The operation was not cancelled
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_panicking_operation_maps_to_internal() {
        let explode = true;
        let result: Result<()> = with_timeout(
            async move {
                if explode {
                    panic!("provider bug");
                }
                Ok(())
            },
            Duration::from_secs(1),
            "panics",
        )
        .await;
        assert!(matches!(result, Err(TravelError::Internal(_))));
    }
}
