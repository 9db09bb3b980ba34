//! Hotel retrieval
//!
//! Query normalization, the cached embedder, the locality filter and the
//! orchestrator that ties cache, single-flight and fallbacks together.

pub mod embedder;
pub mod filter;
pub mod orchestrator;
pub mod types;


pub use embedder::CachedEmbedder;
pub use filter::{extract_destination, filter_by_location, matches_location, normalize_query};
pub use orchestrator::{
    OrchestratorStats, RetrievalComponents, RetrievalDeps, RetrievalOrchestrator,
    RetrievalSettings, RetrievalStats,
};
pub use types::{
    HotelItem, RetrievalQuery, RetrievalResponse, RetrievalResult, RetrievalSource, ServedFrom,
};
