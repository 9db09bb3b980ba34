//! Counting fakes for the pipeline's external collaborators
//!
//! Each fake records how often it was called so tests can assert on the
//! number of computations rather than on timing.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use travel_rag::core::traits::{
    CompletionProvider, CompletionRequest, DurableStore, EmbeddingProvider, HotelSearchApi,
    VectorIndex,
};
use travel_rag::storage::{VectorMatch, VectorPoint};
use travel_rag::{HotelItem, Result, TravelError};

/// Embeds text as a short deterministic vector
#[derive(Default)]
pub struct CountingEmbedder {
    pub calls: AtomicUsize,
    pub delay: Mutex<Duration>,
}

impl CountingEmbedder {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Mutex::new(delay),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for CountingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(vec![text.len() as f32, 0.5, 0.25])
    }

    fn name(&self) -> &str {
        "counting-embedder"
    }
}

/// Returns its hotels in insertion order as nearest neighbours
#[derive(Default)]
pub struct InMemoryIndex {
    pub hotels: Mutex<Vec<HotelItem>>,
    pub delay: Mutex<Duration>,
    pub fail: AtomicBool,
    pub queries: AtomicUsize,
    pub upserted: Mutex<Vec<VectorPoint>>,
}

impl InMemoryIndex {
    pub fn with_hotels(hotels: Vec<HotelItem>) -> Self {
        Self {
            hotels: Mutex::new(hotels),
            ..Self::default()
        }
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn query(
        &self,
        _vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> Result<Vec<VectorMatch>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(TravelError::vector_db("index unavailable"));
        }

        Ok(self
            .hotels
            .lock()
            .iter()
            .take(top_k)
            .enumerate()
            .map(|(rank, hotel)| VectorMatch {
                id: hotel.id.clone(),
                score: 0.99 - rank as f32 * 0.01,
                metadata: include_metadata.then(|| hotel.to_metadata()),
            })
            .collect())
    }

    async fn upsert(&self, points: Vec<VectorPoint>) -> Result<()> {
        self.upserted.lock().extend(points);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "in-memory"
    }
}

/// Hotel API that answers from a fixed list, or fails on demand
#[derive(Default)]
pub struct ScriptedHotelApi {
    pub hotels: Mutex<Vec<HotelItem>>,
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
}

impl ScriptedHotelApi {
    pub fn with_hotels(hotels: Vec<HotelItem>) -> Self {
        Self {
            hotels: Mutex::new(hotels),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        let api = Self::default();
        api.fail.store(true, Ordering::SeqCst);
        api
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HotelSearchApi for ScriptedHotelApi {
    async fn search_by_destination(
        &self,
        destination: &str,
        limit: usize,
    ) -> Result<Vec<HotelItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(TravelError::dependency("hotel_api", "HTTP 503: unavailable"));
        }

        let target = destination.to_lowercase();
        Ok(self
            .hotels
            .lock()
            .iter()
            .filter(|h| {
                h.city
                    .as_deref()
                    .is_some_and(|city| city.to_lowercase() == target)
            })
            .take(limit)
            .cloned()
            .collect())
    }

    fn name(&self) -> &str {
        "scripted-hotel-api"
    }
}

/// Durable store whose every operation fails
pub struct UnreachableStore;

#[async_trait]
impl DurableStore for UnreachableStore {
    async fn get_json(&self, _key: &str) -> Result<Option<Value>> {
        Err(TravelError::cache_unavailable("connection refused"))
    }

    async fn set_json(&self, _key: &str, _value: &Value, _ttl_secs: u64) -> Result<()> {
        Err(TravelError::cache_unavailable("connection refused"))
    }

    async fn set_if_absent(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<bool> {
        Err(TravelError::cache_unavailable("connection refused"))
    }

    async fn delete_if_owner(&self, _key: &str, _expected: &str) -> Result<bool> {
        Err(TravelError::cache_unavailable("connection refused"))
    }

    async fn ping(&self) -> Result<()> {
        Err(TravelError::cache_unavailable("connection refused"))
    }

    fn backend(&self) -> &'static str {
        "unreachable"
    }
}

/// Completion that echoes the hotel count and records every request
#[derive(Default)]
pub struct EchoCompletion {
    pub requests: Mutex<Vec<CompletionRequest>>,
}

#[async_trait]
impl CompletionProvider for EchoCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let reply = format!(
            "I found {} hotels for \"{}\"",
            request.hotels.len(),
            request.message
        );
        self.requests.lock().push(request);
        Ok(reply)
    }

    fn name(&self) -> &str {
        "echo"
    }
}
