//! Durable-store operations on Redis
//!
//! JSON documents with expiry, plus the atomic `SET NX PX` and the
//! compare-and-delete script used by the distributed lock.

use super::pool::RedisPool;
use crate::core::traits::DurableStore;
use crate::utils::error::{Result, TravelError};
use async_trait::async_trait;
use redis::AsyncCommands;
use serde_json::Value;
use std::time::Duration;

/// Deletes the key only while it still holds the caller's token
const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

#[async_trait]
impl DurableStore for RedisPool {
    async fn get_json(&self, key: &str) -> Result<Option<Value>> {
        if self.noop_mode {
            return Ok(None);
        }

        let mut conn = self.get_connection().await?;
        if let Some(ref mut c) = conn.conn {
            let raw: Option<String> = c.get(key).await?;
            match raw {
                Some(text) => Ok(Some(serde_json::from_str(&text)?)),
                None => Ok(None),
            }
        } else {
            Ok(None)
        }
    }

    async fn set_json(&self, key: &str, value: &Value, ttl_secs: u64) -> Result<()> {
        if self.noop_mode {
            return Ok(());
        }

        let payload = serde_json::to_string(value)?;
        let mut conn = self.get_connection().await?;
        if let Some(ref mut c) = conn.conn {
            let _: () = c.set_ex(key, payload, ttl_secs.max(1)).await?;
        }
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        if self.noop_mode {
            return Err(TravelError::cache_unavailable("Redis is in no-op mode"));
        }

        let mut conn = self.get_connection().await?;
        if let Some(ref mut c) = conn.conn {
            let reply: Option<String> = redis::cmd("SET")
                .arg(key)
                .arg(value)
                .arg("NX")
                .arg("PX")
                .arg(ttl.as_millis().max(1) as u64)
                .query_async(c)
                .await?;
            Ok(reply.is_some())
        } else {
            Ok(false)
        }
    }

    async fn delete_if_owner(&self, key: &str, expected: &str) -> Result<bool> {
        if self.noop_mode {
            return Ok(false);
        }

        let mut conn = self.get_connection().await?;
        if let Some(ref mut c) = conn.conn {
            let deleted: i64 = redis::Script::new(RELEASE_SCRIPT)
                .key(key)
                .arg(expected)
                .invoke_async(c)
                .await?;
            Ok(deleted == 1)
        } else {
            Ok(false)
        }
    }

    async fn ping(&self) -> Result<()> {
        self.health_check().await
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
