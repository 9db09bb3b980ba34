//! Qdrant vector store implementation

use crate::config::VectorDbConfig;
use crate::core::traits::VectorIndex;
use crate::utils::error::{Result, TravelError};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use super::types::{VectorMatch, VectorPoint};

/// Payload field carrying the caller's id; Qdrant only accepts UUID or integer ids
const ID_FIELD: &str = "item_id";

/// Qdrant vector store
#[derive(Debug, Clone)]
pub struct QdrantStore {
    url: String,
    api_key: Option<String>,
    collection: String,
    vector_size: usize,
    client: reqwest::Client,
}

impl QdrantStore {
    /// Create a new Qdrant store. No request is made until first use.
    pub fn new(config: &VectorDbConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            collection: config.collection.clone(),
            vector_size: config.vector_size,
            client,
        })
    }

    /// Deterministic point id for an item id
    pub fn point_id(item_id: &str) -> String {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, item_id.as_bytes()).to_string()
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(api_key) => request.header("api-key", api_key),
            None => request,
        }
    }

    /// Ensure collection exists
    pub async fn ensure_collection(&self) -> Result<()> {
        let url = format!("{}/collections/{}", self.url, self.collection);
        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|e| TravelError::VectorDb(format!("Failed to check collection: {}", e)))?;

        if response.status() == 404 {
            self.create_collection().await?;
        } else if !response.status().is_success() {
            return Err(TravelError::VectorDb(format!(
                "Failed to check collection: {}",
                response.status()
            )));
        }

        Ok(())
    }

    /// Create collection
    async fn create_collection(&self) -> Result<()> {
        let url = format!("{}/collections/{}", self.url, self.collection);
        let payload = json!({
            "vectors": {
                "size": self.vector_size,
                "distance": "Cosine"
            }
        });

        let response = self
            .authorized(self.client.put(&url).json(&payload))
            .send()
            .await
            .map_err(|e| TravelError::VectorDb(format!("Failed to create collection: {}", e)))?;

        if !response.status().is_success() {
            return Err(TravelError::VectorDb(format!(
                "Failed to create collection: {}",
                response.status()
            )));
        }

        info!("Created Qdrant collection: {}", self.collection);
        Ok(())
    }

    /// Health check
    pub async fn health_check(&self) -> Result<()> {
        let url = format!("{}/collections/{}", self.url, self.collection);
        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|e| TravelError::VectorDb(format!("Qdrant health check failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(TravelError::VectorDb(format!(
                "Qdrant health check failed: {}",
                response.status()
            )));
        }

        Ok(())
    }

    fn parse_hit(point: &Value) -> Option<VectorMatch> {
        let score = point["score"].as_f64()?;
        let payload = point.get("payload").filter(|p| !p.is_null()).cloned();

        let id = payload
            .as_ref()
            .and_then(|p| p[ID_FIELD].as_str().map(str::to_string))
            .or_else(|| point["id"].as_str().map(str::to_string))
            .or_else(|| point["id"].as_u64().map(|n| n.to_string()))?;

        Some(VectorMatch {
            id,
            score: score as f32,
            metadata: payload,
        })
    }
}

#[async_trait]
impl VectorIndex for QdrantStore {
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> Result<Vec<VectorMatch>> {
        let url = format!("{}/collections/{}/points/search", self.url, self.collection);
        let payload = json!({
            "vector": vector,
            "limit": top_k,
            "with_payload": include_metadata,
            "with_vector": false
        });

        let response = self
            .authorized(self.client.post(&url).json(&payload))
            .send()
            .await
            .map_err(|e| TravelError::VectorDb(format!("Failed to search vectors: {}", e)))?;

        if !response.status().is_success() {
            return Err(TravelError::VectorDb(format!(
                "Failed to search vectors: {}",
                response.status()
            )));
        }

        let result: Value = response.json().await.map_err(|e| {
            TravelError::VectorDb(format!("Failed to parse search response: {}", e))
        })?;

        let matches: Vec<VectorMatch> = result["result"]
            .as_array()
            .map(|points| points.iter().filter_map(Self::parse_hit).collect())
            .unwrap_or_default();

        debug!("Qdrant returned {} matches", matches.len());
        Ok(matches)
    }

    async fn upsert(&self, points: Vec<VectorPoint>) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }

        let url = format!(
            "{}/collections/{}/points?wait=true",
            self.url, self.collection
        );
        let qdrant_points: Vec<Value> = points
            .iter()
            .map(|point| {
                let mut metadata = point.metadata.clone().unwrap_or_else(|| json!({}));
                if let Some(map) = metadata.as_object_mut() {
                    map.insert(ID_FIELD.to_string(), Value::String(point.id.clone()));
                }
                json!({
                    "id": Self::point_id(&point.id),
                    "vector": point.vector,
                    "payload": metadata
                })
            })
            .collect();

        let response = self
            .authorized(
                self.client
                    .put(&url)
                    .json(&json!({ "points": qdrant_points })),
            )
            .send()
            .await
            .map_err(|e| TravelError::VectorDb(format!("Failed to upsert vectors: {}", e)))?;

        if !response.status().is_success() {
            return Err(TravelError::VectorDb(format!(
                "Failed to upsert vectors: {}",
                response.status()
            )));
        }

        debug!("Upserted {} vectors", points.len());
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "qdrant"
    }
}
