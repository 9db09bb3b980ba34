//! # travel-rag
//!
//! Retrieval backend for a travel-recommendation assistant.
//!
//! A user query is embedded, matched against a vector index of hotels and
//! filtered by locality. A third-party hotel API fills in when the index has
//! nothing for the destination. Around that pipeline:
//!
//! - **Tiered cache**: in-process LRU in front of an optional shared durable
//!   tier, with stale-while-revalidate
//! - **Single-flight**: concurrent identical queries share one computation,
//!   across processes when a distributed lock is available
//! - **Resilience**: per-stage timeouts, a circuit breaker and a rate limiter
//!   in front of the hotel API, and last-known results when everything fails
//! - **Chat**: bounded per-session history and completion with a formatted
//!   hotel list as fallback
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use travel_rag::{AppServices, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(None).await?;
//!     let services = AppServices::from_config(&config).await?;
//!
//!     let response = services.orchestrator().retrieve("hotels in Cancun", None).await?;
//!     for hotel in response.hotels() {
//!         println!("{}", hotel.name);
//!     }
//!
//!     let reply = services.chat().respond("session-1", "any with a pool?").await?;
//!     println!("{}", reply.reply);
//!     Ok(())
//! }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod core;
pub mod services;
pub mod storage;
pub mod utils;

// Re-export main types
pub use config::Config;
pub use utils::error::{CircuitBreaker, Result, TimeoutGuard, TravelError};

pub use core::cache_manager::TieredCache;
pub use core::chat::{ChatReply, ChatService, ConversationStore};
pub use core::rate_limiter::RateLimiter;
pub use core::retrieval::{
    HotelItem, RetrievalDeps, RetrievalOrchestrator, RetrievalResponse, RetrievalSource,
    ServedFrom,
};
pub use core::single_flight::SingleFlightCoordinator;
pub use services::{AppServices, HealthStatus};

// Version information
/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
/// Description of the crate
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Build information
#[derive(Debug, Clone)]
pub struct BuildInfo {
    /// Version number
    pub version: &'static str,
    /// Seconds since the epoch at build time
    pub build_time: &'static str,
    /// Git commit hash
    pub git_hash: &'static str,
    /// Rust version
    pub rust_version: &'static str,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            version: VERSION,
            build_time: option_env!("BUILD_TIME").unwrap_or("unknown"),
            git_hash: option_env!("GIT_HASH").unwrap_or("unknown"),
            rust_version: option_env!("RUST_VERSION").unwrap_or("unknown"),
        }
    }
}

/// Build
pub fn build_info() -> BuildInfo {
    BuildInfo::default()
}
