//! Per-session conversation history

use crate::config::ChatConfig;
use crate::core::traits::ChatTurn;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug)]
struct Conversation {
    turns: VecDeque<ChatTurn>,
    last_active: Instant,
}

/// Bounded, expiring conversation histories keyed by session id
#[derive(Debug, Clone)]
pub struct ConversationStore {
    sessions: Arc<DashMap<String, Conversation>>,
    max_turns: usize,
    ttl: Duration,
}

impl ConversationStore {
    pub fn new(max_turns: usize, ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            max_turns: max_turns.max(1),
            ttl,
        }
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        Self::new(config.max_turns, config.session_ttl())
    }

    /// Record a turn; the oldest turns fall off past `max_turns`
    pub fn append(&self, session_id: &str, turn: ChatTurn) {
        let now = Instant::now();
        let mut conversation = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Conversation {
                turns: VecDeque::new(),
                last_active: now,
            });

        if now.duration_since(conversation.last_active) >= self.ttl {
            conversation.turns.clear();
        }
        conversation.turns.push_back(turn);
        while conversation.turns.len() > self.max_turns {
            conversation.turns.pop_front();
        }
        conversation.last_active = now;
    }

    /// Turns of a live session, oldest first
    pub fn history(&self, session_id: &str) -> Vec<ChatTurn> {
        let expired = match self.sessions.get(session_id) {
            Some(conversation) if conversation.last_active.elapsed() < self.ttl => {
                return conversation.turns.iter().cloned().collect();
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.sessions
                .remove_if(session_id, |_, c| c.last_active.elapsed() >= self.ttl);
        }
        Vec::new()
    }

    /// Forget a session; `true` if it existed
    pub fn clear(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    /// Drop idle sessions, returning how many were removed
    pub fn prune_expired(&self) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, conversation| conversation.last_active.elapsed() < self.ttl);
        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            debug!("Pruned {} idle sessions", removed);
        }
        removed
    }

    /// Prune every `interval` until the store is dropped
    pub fn spawn_pruner(&self, interval: Duration) -> JoinHandle<()> {
        let sessions = Arc::downgrade(&self.sessions);
        let store_ttl = self.ttl;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(sessions) = sessions.upgrade() else {
                    break;
                };
                sessions.retain(|_, conversation| conversation.last_active.elapsed() < store_ttl);
            }
        })
    }

    /// Live and not yet pruned sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }
}
