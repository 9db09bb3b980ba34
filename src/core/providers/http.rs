//! Shared HTTP client setup and response handling

use crate::utils::error::{Result, TravelError};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// Idle connections kept per host
const POOL_SIZE: usize = 16;
const KEEPALIVE_SECS: u64 = 90;

/// Client with a per-request deadline and a keep-alive pool
pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .pool_idle_timeout(Duration::from_secs(KEEPALIVE_SECS))
        .pool_max_idle_per_host(POOL_SIZE)
        .build()
        .map_err(|e| TravelError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Attach `Authorization: Bearer` when a key is configured
pub(crate) fn with_bearer(request: RequestBuilder, api_key: Option<&str>) -> RequestBuilder {
    match api_key {
        Some(key) if !key.is_empty() => request.bearer_auth(key),
        _ => request,
    }
}

/// Send and decode a JSON body, mapping failures onto `dependency`
pub(crate) async fn send_json(request: RequestBuilder, dependency: &str) -> Result<Value> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            TravelError::timeout(dependency, 0)
        } else {
            TravelError::dependency(dependency, e.to_string())
        }
    })?;
    read_json(response, dependency).await
}

async fn read_json(response: Response, dependency: &str) -> Result<Value> {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(TravelError::RateLimit(format!("{} returned 429", dependency)));
    }

    let body = response
        .text()
        .await
        .map_err(|e| TravelError::dependency(dependency, e.to_string()))?;

    if !status.is_success() {
        return Err(TravelError::dependency(
            dependency,
            format!("HTTP {}: {}", status.as_u16(), truncate(&body, 200)),
        ));
    }

    serde_json::from_str(&body).map_err(|e| {
        TravelError::dependency(dependency, format!("invalid JSON response: {}", e))
    })
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
