//! Vector index trait

use crate::storage::vector::{VectorMatch, VectorPoint};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Nearest-neighbour index over embeddings with metadata
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Query the `top_k` nearest points, best first
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> Result<Vec<VectorMatch>>;

    /// Insert or replace points by id
    async fn upsert(&self, points: Vec<VectorPoint>) -> Result<()>;

    /// Backend name for logs
    fn backend(&self) -> &'static str;
}
