//! Optimistic distributed lock over a durable store
//!
//! Acquire is a single atomic set-if-absent with expiry; release deletes the
//! key only while it still holds our token. Two holders can coexist once the
//! first outlives the TTL, so the guarded work must be idempotent.

use crate::core::traits::DurableStore;
use crate::utils::error::{Result, with_timeout};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// Lock factory bound to one store
#[derive(Clone)]
pub struct DistributedLock {
    store: Arc<dyn DurableStore>,
    prefix: String,
    ttl: Duration,
    op_timeout: Duration,
}

impl std::fmt::Debug for DistributedLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistributedLock")
            .field("backend", &self.store.backend())
            .field("prefix", &self.prefix)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl DistributedLock {
    /// Locks named `{prefix}:{key}` that self-expire after `ttl`
    pub fn new(
        store: Arc<dyn DurableStore>,
        prefix: impl Into<String>,
        ttl: Duration,
        op_timeout: Duration,
    ) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            ttl,
            op_timeout,
        }
    }

    /// Store key guarding `key`
    pub fn lock_key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }

    /// Lifetime of an acquired lock
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Try once to take the lock. `Ok(None)` means another owner holds it.
    pub async fn try_acquire(&self, key: &str) -> Result<Option<LockGuard>> {
        let lock_key = self.lock_key(key);
        let token = Uuid::new_v4().to_string();

        let store = Arc::clone(&self.store);
        let (k, t, ttl) = (lock_key.clone(), token.clone(), self.ttl);
        let acquired = with_timeout(
            async move { store.set_if_absent(&k, &t, ttl).await },
            self.op_timeout,
            "lock_acquire",
        )
        .await?;

        if !acquired {
            debug!("Lock {} held elsewhere", lock_key);
            return Ok(None);
        }

        debug!("Acquired lock {}", lock_key);
        Ok(Some(LockGuard {
            store: Arc::clone(&self.store),
            lock_key,
            token,
            op_timeout: self.op_timeout,
            released: false,
        }))
    }
}

/// Proof of lock ownership. Released explicitly, or in the background on drop.
pub struct LockGuard {
    store: Arc<dyn DurableStore>,
    lock_key: String,
    token: String,
    op_timeout: Duration,
    released: bool,
}

impl LockGuard {
    /// Random owner token written into the lock key
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Store key of this lock
    pub fn lock_key(&self) -> &str {
        &self.lock_key
    }

    /// Delete the lock if we still own it. `false` means it had already expired.
    pub async fn release(mut self) -> Result<bool> {
        self.released = true;
        let deleted = release_lock(
            Arc::clone(&self.store),
            self.lock_key.clone(),
            self.token.clone(),
            self.op_timeout,
        )
        .await?;

        if !deleted {
            debug!("Lock {} expired before release", self.lock_key);
        }
        Ok(deleted)
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let store = Arc::clone(&self.store);
        let lock_key = std::mem::take(&mut self.lock_key);
        let token = std::mem::take(&mut self.token);
        let op_timeout = self.op_timeout;
        handle.spawn(async move {
            if let Err(e) = release_lock(store, lock_key.clone(), token, op_timeout).await {
                warn!("Failed to release lock {}: {}", lock_key, e);
            }
        });
    }
}

async fn release_lock(
    store: Arc<dyn DurableStore>,
    lock_key: String,
    token: String,
    op_timeout: Duration,
) -> Result<bool> {
    with_timeout(
        async move { store.delete_if_owner(&lock_key, &token).await },
        op_timeout,
        "lock_release",
    )
    .await
}
