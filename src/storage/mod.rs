//! Storage layer
//!
//! Durable key-value backends (the shared cache tier and lock primitive) and
//! the vector index.

/// Process-local durable store
pub mod memory;
/// Redis durable store
pub mod redis;
/// Vector storage module
pub mod vector;

pub use memory::MemoryStore;
pub use redis::RedisPool;
pub use vector::{QdrantStore, VectorMatch, VectorPoint};
