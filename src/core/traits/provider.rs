//! Collaborator traits for the retrieval pipeline
//!
//! Embedding generation, the third-party hotel API and the language model are
//! all reached through these seams so the pipeline can run against fakes.

use crate::core::retrieval::HotelItem;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Text to fixed-length vector
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed one text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Provider name for logs and metrics
    fn name(&self) -> &str;
}

/// Third-party hotel search keyed by destination
#[async_trait]
pub trait HotelSearchApi: Send + Sync {
    /// Search hotels for a destination, at most `limit` items
    async fn search_by_destination(&self, destination: &str, limit: usize)
    -> Result<Vec<HotelItem>>;

    /// Provider name for logs and metrics
    fn name(&self) -> &str;
}

/// Role of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// End user
    User,
    /// Assistant reply
    Assistant,
}

/// One conversation turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Who spoke
    pub role: ChatRole,
    /// What was said
    pub content: String,
}

impl ChatTurn {
    /// User turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Input for a completion: retrieved hotels plus conversation context
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Latest user message
    pub message: String,
    /// Earlier turns, oldest first
    pub history: Vec<ChatTurn>,
    /// Hotels retrieved for this message, in relevance order
    pub hotels: Vec<HotelItem>,
}

/// Language model turning retrieved items and history into prose
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Produce the assistant reply
    async fn complete(&self, request: CompletionRequest) -> Result<String>;

    /// Provider name for logs and metrics
    fn name(&self) -> &str;
}
