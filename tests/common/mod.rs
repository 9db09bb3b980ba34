//! Common test utilities for travel-rag
//!
//! - Counting fakes for the embedder, index, hotel API, durable store and
//!   completion provider
//! - Hotel fixtures and a fast-timeout configuration
//! - [`Pipeline`], an orchestrator wired to fakes

pub mod fakes;
pub mod fixtures;

pub use fakes::{
    CountingEmbedder, EchoCompletion, InMemoryIndex, ScriptedHotelApi, UnreachableStore,
};
pub use fixtures::{HotelFactory, fast_config};

use std::sync::Arc;
use std::time::Duration;
use travel_rag::core::traits::{DurableStore, HotelSearchApi};
use travel_rag::{Config, RetrievalDeps, RetrievalOrchestrator};

/// An orchestrator plus handles on its fakes
pub struct Pipeline {
    pub orchestrator: RetrievalOrchestrator,
    pub embedder: Arc<CountingEmbedder>,
    pub index: Arc<InMemoryIndex>,
    pub api: Option<Arc<ScriptedHotelApi>>,
}

impl Pipeline {
    pub fn builder(config: Config) -> PipelineBuilder {
        PipelineBuilder {
            config,
            embedder: Arc::new(CountingEmbedder::default()),
            index: Arc::new(InMemoryIndex::default()),
            api: None,
            durable: None,
        }
    }
}

pub struct PipelineBuilder {
    config: Config,
    embedder: Arc<CountingEmbedder>,
    index: Arc<InMemoryIndex>,
    api: Option<Arc<ScriptedHotelApi>>,
    durable: Option<Arc<dyn DurableStore>>,
}

impl PipelineBuilder {
    pub fn embedder(mut self, embedder: CountingEmbedder) -> Self {
        self.embedder = Arc::new(embedder);
        self
    }

    pub fn index(mut self, index: Arc<InMemoryIndex>) -> Self {
        self.index = index;
        self
    }

    pub fn api(mut self, api: ScriptedHotelApi) -> Self {
        self.api = Some(Arc::new(api));
        self
    }

    pub fn durable(mut self, store: Arc<dyn DurableStore>) -> Self {
        self.durable = Some(store);
        self
    }

    pub fn build(self) -> Pipeline {
        let hotel_api = self
            .api
            .clone()
            .map(|api| api as Arc<dyn HotelSearchApi>);
        let orchestrator = RetrievalOrchestrator::from_config(
            &self.config,
            RetrievalDeps {
                embedder: self.embedder.clone(),
                index: self.index.clone(),
                hotel_api,
                durable: self.durable,
            },
        )
        .expect("valid pipeline configuration");

        Pipeline {
            orchestrator,
            embedder: self.embedder,
            index: self.index,
            api: self.api,
        }
    }
}

/// Poll `condition` every 10ms until it holds or `timeout` passes
pub async fn wait_until<F: Fn() -> bool>(condition: F, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
