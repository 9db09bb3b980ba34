//! Durable key-value store trait
//!
//! The shared second cache tier and the primitive behind the distributed lock.

use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Cross-process key-value store.
///
/// Implementations must treat every operation as non-atomic except
/// [`DurableStore::set_if_absent`], which must be a single atomic
/// conditional write with expiry at the store's protocol level.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Read a JSON document, `None` when absent or expired
    async fn get_json(&self, key: &str) -> Result<Option<Value>>;

    /// Write a JSON document that expires after `ttl_secs`
    async fn set_json(&self, key: &str, value: &Value, ttl_secs: u64) -> Result<()>;

    /// Atomically write `value` only if `key` does not exist, with expiry
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool>;

    /// Delete `key` only if it still holds `expected`
    async fn delete_if_owner(&self, key: &str, expected: &str) -> Result<bool>;

    /// Connectivity probe
    async fn ping(&self) -> Result<()>;

    /// Backend name for logs
    fn backend(&self) -> &'static str;
}
