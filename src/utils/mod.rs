//! Utility modules
//!
//! - **error**: crate error type, circuit breaker and timeout guard
//! - **logging**: subscriber setup and secret masking

pub mod error;
pub mod logging;

/// Format duration as human readable string
pub fn format_duration(duration_ms: u64) -> String {
    if duration_ms < 1000 {
        format!("{}ms", duration_ms)
    } else if duration_ms < 60_000 {
        format!("{:.1}s", duration_ms as f64 / 1000.0)
    } else {
        format!("{:.1}m", duration_ms as f64 / 60_000.0)
    }
}
