//! OpenAI-compatible embeddings client

use super::http::{build_client, send_json, with_bearer};
use crate::config::EmbeddingProviderConfig;
use crate::core::traits::EmbeddingProvider;
use crate::utils::error::{Result, TravelError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const NAME: &str = "embedding";

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// `POST {base_url}/embeddings`
#[derive(Debug, Clone)]
pub struct OpenAiEmbeddings {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiEmbeddings {
    /// Client for `config`; each request is bounded by `timeout`
    pub fn new(config: &EmbeddingProviderConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    /// Model name sent with each request
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/embeddings", self.base_url);
        let body = json!({
            "model": self.model,
            "input": text,
        });

        let request = with_bearer(self.client.post(&url).json(&body), self.api_key.as_deref());
        let value = send_json(request, NAME).await?;

        let response: EmbeddingResponse = serde_json::from_value(value)
            .map_err(|e| TravelError::dependency(NAME, format!("unexpected response: {}", e)))?;

        let vector = response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| TravelError::dependency(NAME, "response contained no embedding"))?;

        debug!("Embedded {} chars into {} dims", text.len(), vector.len());
        Ok(vector)
    }

    fn name(&self) -> &str {
        NAME
    }
}
