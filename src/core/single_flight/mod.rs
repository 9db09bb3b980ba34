//! Single-flight coordination
//!
//! - `inflight` - per-process coalescing of identical in-flight work
//! - `lock` - optimistic distributed lock over the durable store
//! - `coordinator` - both combined, with bounded wait-and-poll

pub mod coordinator;
pub mod inflight;
pub mod lock;
mod types;


pub use coordinator::{SingleFlightCoordinator, WaitPolicy};
pub use inflight::InFlightRegistry;
pub use lock::{DistributedLock, LockGuard};
pub use types::SingleFlightStats;
