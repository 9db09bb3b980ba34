//! Retrieval data types

use crate::storage::vector::VectorMatch;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::filter::normalize_query;

/// One hotel as retrieved from the vector index or the hotel API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HotelItem {
    /// Stable identifier
    #[serde(default)]
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// City or locality
    #[serde(default)]
    pub city: Option<String>,
    /// Street address
    #[serde(default)]
    pub address: Option<String>,
    /// Country
    #[serde(default)]
    pub country: Option<String>,
    /// Free-text description
    #[serde(default)]
    pub description: Option<String>,
    /// Nightly price
    #[serde(default)]
    pub price_per_night: Option<f64>,
    /// ISO currency code of `price_per_night`
    #[serde(default)]
    pub currency: Option<String>,
    /// Guest rating out of 5
    #[serde(default)]
    pub rating: Option<f32>,
    /// Amenity labels
    #[serde(default)]
    pub amenities: Vec<String>,
    /// Relevance score from the vector index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl HotelItem {
    /// Build from a vector hit; `None` when the hit carries no usable metadata
    pub fn from_match(hit: &VectorMatch) -> Option<Self> {
        let metadata = hit.metadata.as_ref()?;
        let mut item: HotelItem = serde_json::from_value(metadata.clone()).ok()?;
        item.id = hit.id.clone();
        item.score = Some(hit.score);
        Some(item)
    }

    /// Metadata stored alongside this item's vector
    pub fn to_metadata(&self) -> Value {
        let mut value = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Some(map) = value.as_object_mut() {
            map.remove("score");
            map.remove("id");
        }
        value
    }

    /// Text embedded when indexing this item
    pub fn embedding_text(&self) -> String {
        let mut parts = vec![self.name.clone()];
        for field in [&self.city, &self.country, &self.description] {
            if let Some(text) = field.as_deref().filter(|t| !t.trim().is_empty()) {
                parts.push(text.to_string());
            }
        }
        if !self.amenities.is_empty() {
            parts.push(self.amenities.join(", "));
        }
        parts.join(". ")
    }
}

/// A user query, normalized for cache keying
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalQuery {
    /// Text as the user wrote it
    pub text: String,
    /// Lowercased, trimmed, whitespace-collapsed text
    pub normalized: String,
    /// Number of items wanted
    pub top_k: usize,
}

impl RetrievalQuery {
    /// Normalize `text` for `top_k` results
    pub fn new(text: impl Into<String>, top_k: usize) -> Self {
        let text = text.into();
        let normalized = normalize_query(&text);
        Self {
            text,
            normalized,
            top_k: top_k.max(1),
        }
    }

    /// Key shared by the cache, the in-flight registry and the lock
    pub fn cache_key(&self) -> String {
        format!("{}#{}", self.normalized, self.top_k)
    }
}

/// Where a result's items came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalSource {
    /// Vector index, after the locality filter
    VectorIndex,
    /// Third-party hotel API
    ExternalApi,
    /// Vector candidates that did not pass the locality filter
    UnfilteredVector,
    /// Previously cached result past its windows
    LastKnown,
}

impl RetrievalSource {
    /// Whether the result is a complete fresh computation worth caching
    pub fn is_authoritative(&self) -> bool {
        matches!(self, Self::VectorIndex | Self::ExternalApi)
    }
}

/// Outcome of one retrieval computation, as cached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// Original query text, used to revalidate this entry
    pub query: String,
    /// Number of items requested
    pub top_k: usize,
    /// Items in relevance order
    pub hotels: Vec<HotelItem>,
    /// Origin of `hotels`
    pub source: RetrievalSource,
    /// Destination extracted from the query, if any
    pub destination: Option<String>,
    /// When the items were produced (epoch millis)
    pub generated_at_ms: u64,
}

impl RetrievalResult {
    /// Query this result answers
    pub fn retrieval_query(&self) -> RetrievalQuery {
        RetrievalQuery::new(self.query.clone(), self.top_k)
    }
}

/// How a response was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServedFrom {
    /// Cache hit inside the fresh window
    CacheFresh,
    /// Cache hit inside the stale window; refresh scheduled
    CacheStale,
    /// Computed (or joined an in-flight computation) for this request
    Computed,
}

/// What `retrieve` returns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalResponse {
    /// The result
    pub result: RetrievalResult,
    /// How it was obtained
    pub served_from: ServedFrom,
}

impl RetrievalResponse {
    /// Items in relevance order
    pub fn hotels(&self) -> &[HotelItem] {
        &self.result.hotels
    }

    /// Whether the items come from a fallback rather than a full computation
    pub fn is_degraded(&self) -> bool {
        !self.result.source.is_authoritative()
    }
}
