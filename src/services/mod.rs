//! Service wiring
//!
//! Builds the storage backends, providers, retrieval pipeline and chat layer
//! from one [`Config`] and hands out shared handles to them.

use crate::config::Config;
use crate::core::chat::{ChatService, ChatStats, ConversationStore};
use crate::core::providers::{HttpHotelSearch, OpenAiCompletion, OpenAiEmbeddings};
use crate::core::retrieval::{OrchestratorStats, RetrievalDeps, RetrievalOrchestrator};
use crate::core::traits::{CompletionProvider, DurableStore, HotelSearchApi};
use crate::storage::{QdrantStore, RedisPool};
use crate::utils::error::Result;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Reachability of the external stores
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// Durable cache tier answered a ping
    pub durable: bool,
    /// Vector collection is reachable
    pub vector: bool,
    /// Hotel API breaker is open
    pub hotel_api_circuit_open: bool,
}

impl HealthStatus {
    /// The vector index is the only store retrieval cannot do without
    pub fn is_healthy(&self) -> bool {
        self.vector
    }
}

/// Every counter the running services expose
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    pub retrieval: OrchestratorStats,
    pub chat: ChatStats,
    pub active_sessions: usize,
}

/// Application services built from configuration
#[derive(Debug, Clone)]
pub struct AppServices {
    config: Arc<Config>,
    redis: RedisPool,
    vector: Arc<QdrantStore>,
    orchestrator: RetrievalOrchestrator,
    chat: ChatService,
}

impl AppServices {
    /// Connect stores and build the pipeline.
    ///
    /// An unreachable Redis degrades to in-process caching; only malformed
    /// configuration fails here.
    pub async fn from_config(config: &Config) -> Result<Self> {
        info!("Initializing travel services");

        let redis = RedisPool::connect_or_noop(&config.storage.redis).await;
        let durable: Option<Arc<dyn DurableStore>> = if redis.is_noop() {
            None
        } else {
            Some(Arc::new(redis.clone()))
        };

        let vector = Arc::new(QdrantStore::new(&config.storage.vector)?);
        if let Err(e) = vector.ensure_collection().await {
            warn!("Vector collection not ready, queries may fail: {}", e);
        }

        let retrieval = &config.retrieval;
        let embedder = OpenAiEmbeddings::new(
            &config.providers.embedding,
            Duration::from_millis(retrieval.embedding_timeout_ms),
        )?;
        let hotel_api = HttpHotelSearch::from_config(
            &config.providers.hotel_api,
            Duration::from_millis(retrieval.hotel_api_timeout_ms),
        )?
        .map(|api| Arc::new(api) as Arc<dyn HotelSearchApi>);
        if hotel_api.is_none() {
            info!("No hotel API configured, vector index is the only live source");
        }

        let orchestrator = RetrievalOrchestrator::from_config(
            config,
            RetrievalDeps {
                embedder: Arc::new(embedder),
                index: vector.clone(),
                hotel_api,
                durable,
            },
        )?;

        let completion = match config.providers.completion.api_key {
            Some(_) => Some(Arc::new(OpenAiCompletion::new(
                &config.providers.completion,
                config.chat.completion_timeout(),
            )?) as Arc<dyn CompletionProvider>),
            None => {
                info!("No completion API key, chat replies will be hotel lists");
                None
            }
        };

        let sessions = ConversationStore::from_config(&config.chat);
        sessions.spawn_pruner(config.chat.prune_interval());

        let chat = ChatService::new(
            orchestrator.clone(),
            completion,
            sessions,
            config.chat.completion_timeout(),
        );

        info!("Travel services initialized");
        Ok(Self {
            config: Arc::new(config.clone()),
            redis,
            vector,
            orchestrator,
            chat,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Retrieval pipeline
    pub fn orchestrator(&self) -> &RetrievalOrchestrator {
        &self.orchestrator
    }

    /// Conversation layer
    pub fn chat(&self) -> &ChatService {
        &self.chat
    }

    /// Whether a shared durable tier is in use
    pub fn has_durable_tier(&self) -> bool {
        !self.redis.is_noop()
    }

    /// Ping both stores
    pub async fn health_check(&self) -> HealthStatus {
        let (durable, vector) = tokio::join!(self.redis.health_check(), self.vector.health_check());
        if let Err(e) = &vector {
            warn!("Vector health check failed: {}", e);
        }

        HealthStatus {
            durable: durable.is_ok(),
            vector: vector.is_ok(),
            hotel_api_circuit_open: self.orchestrator.breaker().is_open(),
        }
    }

    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            retrieval: self.orchestrator.stats(),
            chat: self.chat.stats(),
            active_sessions: self.chat.sessions().len(),
        }
    }
}
