//! Configuration validation
//!
//! The validation is organized into several submodules:
//! - `trait_def`: Core Validate trait definition
//! - `pipeline_validators`: retrieval, cache, lock, breaker and rate limit
//! - `storage_validators`: Redis and Qdrant
//! - `service_validators`: providers, chat and logging

mod pipeline_validators;
mod service_validators;
mod storage_validators;
mod trait_def;

pub use trait_def::Validate;

/// Reject zero for a duration or size named `what`
pub(crate) fn non_zero<N: PartialEq + Default>(value: N, what: &str) -> Result<(), String> {
    if value == N::default() {
        return Err(format!("{} must be greater than 0", what));
    }
    Ok(())
}
