//! Type definitions for vector storage

use serde::{Deserialize, Serialize};

/// Scored hit returned by a nearest-neighbour query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMatch {
    /// Item identifier (the hotel id, not the backend's point id)
    pub id: String,
    /// Similarity score, higher is closer
    pub score: f32,
    /// Associated metadata
    pub metadata: Option<serde_json::Value>,
}

/// Vector point for storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorPoint {
    /// Item identifier
    pub id: String,
    /// Vector data
    pub vector: Vec<f32>,
    /// Associated metadata
    pub metadata: Option<serde_json::Value>,
}

impl VectorPoint {
    /// Point with metadata
    pub fn new(id: impl Into<String>, vector: Vec<f32>, metadata: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            vector,
            metadata: Some(metadata),
        }
    }
}
