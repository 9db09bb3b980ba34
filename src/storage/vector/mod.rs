//! Vector database implementation
//!
//! This module provides vector storage and similarity search functionality.

mod qdrant;
mod types;

// Re-export public types
pub use qdrant::QdrantStore;
pub use types::{VectorMatch, VectorPoint};
