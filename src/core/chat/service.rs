//! Chat turn handling: retrieval, completion and degradation

use super::formatting::{backfill, format_hotel_list};
use super::session::ConversationStore;
use crate::core::retrieval::{
    HotelItem, RetrievalOrchestrator, RetrievalSource, ServedFrom, extract_destination,
};
use crate::core::traits::{ChatRole, ChatTurn, CompletionProvider, CompletionRequest};
use crate::utils::error::{Result, TravelError, with_timeout};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Reply when no data source could answer
pub const DEGRADED_REPLY: &str = "I'm having trouble reaching our hotel data right now. \
Please try again in a moment.";

const NO_RESULTS_REPLY: &str = "I couldn't find hotels matching that request. \
Could you tell me more about where you'd like to stay?";

const LIST_INTRO: &str = "Here are some hotels I found:";

/// Outcome of one chat turn
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub session_id: String,
    /// Assistant text
    pub reply: String,
    /// Hotels behind the reply, display fields backfilled
    pub hotels: Vec<HotelItem>,
    /// Where the hotels came from, `None` when retrieval failed
    pub source: Option<RetrievalSource>,
    pub served_from: Option<ServedFrom>,
    /// Some stage fell back to a cheaper answer
    pub degraded: bool,
}

#[derive(Debug, Default)]
struct AtomicChatStats {
    replies: AtomicU64,
    degraded: AtomicU64,
    completion_failures: AtomicU64,
}

/// Chat counters
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatStats {
    pub replies: u64,
    pub degraded: u64,
    pub completion_failures: u64,
}

/// Answers user messages from retrieved hotels and conversation context
#[derive(Clone)]
pub struct ChatService {
    retrieval: RetrievalOrchestrator,
    completion: Option<Arc<dyn CompletionProvider>>,
    sessions: ConversationStore,
    completion_timeout: Duration,
    stats: Arc<AtomicChatStats>,
}

impl std::fmt::Debug for ChatService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatService")
            .field(
                "completion",
                &self.completion.as_ref().map(|c| c.name().to_string()),
            )
            .field("completion_timeout", &self.completion_timeout)
            .finish()
    }
}

impl ChatService {
    /// Without a completion provider replies are formatted hotel lists
    pub fn new(
        retrieval: RetrievalOrchestrator,
        completion: Option<Arc<dyn CompletionProvider>>,
        sessions: ConversationStore,
        completion_timeout: Duration,
    ) -> Self {
        Self {
            retrieval,
            completion,
            sessions,
            completion_timeout,
            stats: Arc::new(AtomicChatStats::default()),
        }
    }

    /// Answer `message` in `session_id`.
    ///
    /// Fails only on an empty message; every downstream failure becomes a
    /// degraded reply.
    pub async fn respond(&self, session_id: &str, message: &str) -> Result<ChatReply> {
        let message = message.trim();
        if message.is_empty() {
            return Err(TravelError::validation("message is empty"));
        }

        let history = self.sessions.history(session_id);
        let query = contextual_query(message, &history);
        debug!("Session {} retrieval query: {}", session_id, query);

        let (reply, hotels, source, served_from, degraded) =
            match self.retrieval.retrieve(&query, None).await {
                Ok(response) => {
                    let hotels: Vec<HotelItem> = response.hotels().iter().map(backfill).collect();
                    let (reply, completion_ok) =
                        self.compose(message, history, hotels.clone()).await;
                    let degraded = response.is_degraded() || !completion_ok;
                    (
                        reply,
                        hotels,
                        Some(response.result.source),
                        Some(response.served_from),
                        degraded,
                    )
                }
                Err(e) => {
                    warn!("Retrieval failed for session {}: {}", session_id, e);
                    (DEGRADED_REPLY.to_string(), Vec::new(), None, None, true)
                }
            };

        self.sessions.append(session_id, ChatTurn::user(message));
        self.sessions
            .append(session_id, ChatTurn::assistant(reply.clone()));

        self.stats.replies.fetch_add(1, Ordering::Relaxed);
        if degraded {
            self.stats.degraded.fetch_add(1, Ordering::Relaxed);
        }

        Ok(ChatReply {
            session_id: session_id.to_string(),
            reply,
            hotels,
            source,
            served_from,
            degraded,
        })
    }

    /// Completion under its deadline; the formatted list when that fails.
    /// Returns the text and whether the completion succeeded.
    async fn compose(
        &self,
        message: &str,
        history: Vec<ChatTurn>,
        hotels: Vec<HotelItem>,
    ) -> (String, bool) {
        let Some(provider) = self.completion.clone() else {
            return (list_reply(&hotels), true);
        };

        let request = CompletionRequest {
            message: message.to_string(),
            history,
            hotels: hotels.clone(),
        };
        let outcome = with_timeout(
            async move { provider.complete(request).await },
            self.completion_timeout,
            "completion",
        )
        .await;

        match outcome {
            Ok(text) => (text, true),
            Err(e) => {
                self.stats
                    .completion_failures
                    .fetch_add(1, Ordering::Relaxed);
                warn!("Completion failed, replying with the hotel list: {}", e);
                (list_reply(&hotels), false)
            }
        }
    }

    /// Conversation histories
    pub fn sessions(&self) -> &ConversationStore {
        &self.sessions
    }

    /// Retrieval pipeline behind this service
    pub fn retrieval(&self) -> &RetrievalOrchestrator {
        &self.retrieval
    }

    pub fn stats(&self) -> ChatStats {
        ChatStats {
            replies: self.stats.replies.load(Ordering::Relaxed),
            degraded: self.stats.degraded.load(Ordering::Relaxed),
            completion_failures: self.stats.completion_failures.load(Ordering::Relaxed),
        }
    }
}

fn list_reply(hotels: &[HotelItem]) -> String {
    if hotels.is_empty() {
        NO_RESULTS_REPLY.to_string()
    } else {
        format!("{}\n{}", LIST_INTRO, format_hotel_list(hotels))
    }
}

/// Follow-ups without a destination inherit the session's latest one,
/// e.g. "cheaper options?" after "hotels in Cancun".
pub fn contextual_query(message: &str, history: &[ChatTurn]) -> String {
    if extract_destination(message).is_some() {
        return message.to_string();
    }

    history
        .iter()
        .rev()
        .filter(|turn| turn.role == ChatRole::User)
        .find_map(|turn| extract_destination(&turn.content))
        .map(|destination| format!("{} in {}", message, destination))
        .unwrap_or_else(|| message.to_string())
}
