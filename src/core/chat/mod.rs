//! Conversation layer
//!
//! Session histories, the chat turn handler and hotel display formatting.

pub mod formatting;
pub mod service;
pub mod session;


pub use service::{ChatReply, ChatService, ChatStats, DEGRADED_REPLY, contextual_query};
pub use session::ConversationStore;
