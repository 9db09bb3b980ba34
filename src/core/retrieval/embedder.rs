//! Embedding generation with a content-hash cache
//!
//! Text to vector is stable, so embeddings are cached under the SHA-256 of
//! the normalized text with a long fresh window.

use super::filter::normalize_query;
use crate::core::cache_manager::TieredCache;
use crate::core::traits::EmbeddingProvider;
use crate::utils::error::{Result, TimeoutGuard, TravelError};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// Embedding provider behind a cache and a deadline
#[derive(Clone)]
pub struct CachedEmbedder {
    provider: Arc<dyn EmbeddingProvider>,
    cache: TieredCache<Vec<f32>>,
    deadline: TimeoutGuard,
    provider_calls: Arc<AtomicU64>,
}

impl std::fmt::Debug for CachedEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedEmbedder")
            .field("provider", &self.provider.name())
            .field("timeout", &self.deadline.timeout())
            .finish()
    }
}

impl CachedEmbedder {
    /// Wrap `provider`; every provider call gets `timeout`
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        cache: TieredCache<Vec<f32>>,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            cache,
            deadline: TimeoutGuard::new("embedding", timeout),
            provider_calls: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Cache key for `text`
    pub fn content_key(text: &str) -> String {
        hex::encode(Sha256::digest(normalize_query(text).as_bytes()))
    }

    /// Vector for `text`, from cache when possible
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let key = Self::content_key(text);
        if let Some(vector) = self.cache.get(&key).await.value {
            debug!("Embedding cache hit for {}", &key[..12]);
            return Ok(vector);
        }

        let vector = self.embed_uncached(text).await?;
        self.cache.set(&key, vector.clone()).await;
        Ok(vector)
    }

    /// Call the provider directly under the deadline
    pub async fn embed_uncached(&self, text: &str) -> Result<Vec<f32>> {
        self.provider_calls.fetch_add(1, Ordering::Relaxed);
        let provider = Arc::clone(&self.provider);
        let owned = text.to_string();

        let vector = self
            .deadline
            .run(async move { provider.embed(&owned).await })
            .await?;

        if vector.is_empty() {
            return Err(TravelError::dependency(
                self.provider.name(),
                "provider returned an empty embedding",
            ));
        }
        Ok(vector)
    }

    /// Provider calls made so far (cache misses)
    pub fn provider_calls(&self) -> u64 {
        self.provider_calls.load(Ordering::Relaxed)
    }

    /// Embedding cache statistics
    pub fn cache(&self) -> &TieredCache<Vec<f32>> {
        &self.cache
    }
}
