//! Redis storage implementation
//!
//! This module provides Redis connectivity and the durable-store operations.
//!
//! ## Module Structure
//!
//! - `pool` - Connection management, no-op fallback, health checks
//! - `cache` - `DurableStore` implementation (JSON get/set, NX lock, owner delete)
//! - `tests` - Module tests

mod cache;
mod pool;

// Re-export public types
pub use pool::{RedisConnection, RedisPool};
