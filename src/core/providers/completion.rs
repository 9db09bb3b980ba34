//! OpenAI-compatible chat completions client

use super::http::{build_client, send_json, with_bearer};
use crate::config::CompletionProviderConfig;
use crate::core::chat::formatting::describe_hotel;
use crate::core::traits::{ChatRole, CompletionProvider, CompletionRequest};
use crate::utils::error::{Result, TravelError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;

const NAME: &str = "completion";

const SYSTEM_PROMPT: &str = "You are a travel assistant. Recommend hotels only from the \
list provided. If the list is empty, say no matching hotels were found.";

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// `POST {base_url}/chat/completions`
#[derive(Debug, Clone)]
pub struct OpenAiCompletion {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiCompletion {
    pub fn new(config: &CompletionProviderConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    /// System context, history and the new message, in API order
    fn messages(request: &CompletionRequest) -> Vec<Value> {
        let hotels = if request.hotels.is_empty() {
            "No hotels matched.".to_string()
        } else {
            request
                .hotels
                .iter()
                .enumerate()
                .map(|(i, hotel)| format!("{}. {}", i + 1, describe_hotel(hotel)))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let mut messages = vec![json!({
            "role": "system",
            "content": format!("{}\n\nHotels:\n{}", SYSTEM_PROMPT, hotels),
        })];
        messages.extend(request.history.iter().map(|turn| {
            let role = match turn.role {
                ChatRole::User => "user",
                ChatRole::Assistant => "assistant",
            };
            json!({ "role": role, "content": turn.content })
        }));
        messages.push(json!({ "role": "user", "content": request.message }));
        messages
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": Self::messages(&request),
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        let request = with_bearer(self.client.post(&url).json(&body), self.api_key.as_deref());
        let value = send_json(request, NAME).await?;
        let response: CompletionResponse = serde_json::from_value(value)
            .map_err(|e| TravelError::dependency(NAME, format!("unexpected response: {}", e)))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| TravelError::dependency(NAME, "response contained no message"))
    }

    fn name(&self) -> &str {
        NAME
    }
}
