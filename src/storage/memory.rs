//! Process-local durable store
//!
//! Implements [`DurableStore`] over a `DashMap` with per-key expiry, for
//! orchestrators wired by hand without Redis. Several orchestrators pointed at
//! one instance behave like processes sharing a Redis server.

use crate::core::traits::DurableStore;
use crate::utils::error::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Expired keys are swept once per this many writes
const SWEEP_EVERY: u64 = 64;

#[derive(Debug, Clone)]
enum Stored {
    Json(Value),
    Token(String),
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: Stored,
    expires_at: Instant,
}

impl MemoryEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-memory [`DurableStore`]
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, MemoryEntry>>,
    writes: Arc<AtomicU64>,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.is_live(now)).count()
    }

    /// Whether no live keys remain
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `key` currently exists
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|e| e.is_live(Instant::now()))
    }

    /// Drop every expired key, returning how many went
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        before.saturating_sub(self.entries.len())
    }

    /// Must not be called while holding a map guard
    fn note_write(&self) {
        let writes = self.writes.fetch_add(1, Ordering::Relaxed) + 1;
        if writes % SWEEP_EVERY == 0 {
            self.purge_expired();
        }
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn get_json(&self, key: &str) -> Result<Option<Value>> {
        let now = Instant::now();
        let hit = match self.entries.get(key) {
            Some(entry) if entry.is_live(now) => match &entry.value {
                Stored::Json(value) => Some(value.clone()),
                Stored::Token(token) => Some(Value::String(token.clone())),
            },
            Some(_) => None,
            None => return Ok(None),
        };

        if hit.is_none() {
            self.entries.remove_if(key, |_, e| !e.is_live(now));
        }
        Ok(hit)
    }

    async fn set_json(&self, key: &str, value: &Value, ttl_secs: u64) -> Result<()> {
        self.entries.insert(
            key.to_string(),
            MemoryEntry {
                value: Stored::Json(value.clone()),
                expires_at: Instant::now() + Duration::from_secs(ttl_secs.max(1)),
            },
        );
        self.note_write();
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let now = Instant::now();
        let fresh = MemoryEntry {
            value: Stored::Token(value.to_string()),
            expires_at: now + ttl,
        };

        let acquired = match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_live(now) {
                    false
                } else {
                    occupied.insert(fresh);
                    true
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(fresh);
                true
            }
        };
        if acquired {
            self.note_write();
        }
        Ok(acquired)
    }

    async fn delete_if_owner(&self, key: &str, expected: &str) -> Result<bool> {
        let now = Instant::now();
        let removed = self.entries.remove_if(key, |_, entry| {
            entry.is_live(now) && matches!(&entry.value, Stored::Token(t) if t == expected)
        });
        Ok(removed.is_some())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
