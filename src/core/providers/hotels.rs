//! REST client for the third-party hotel search API

use super::http::{build_client, send_json, with_bearer};
use crate::config::HotelApiConfig;
use crate::core::retrieval::HotelItem;
use crate::core::traits::HotelSearchApi;
use crate::utils::error::{Result, TravelError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const NAME: &str = "hotel_api";

/// Hotel record as the API returns it
#[derive(Debug, Deserialize)]
struct ApiHotel {
    #[serde(default, alias = "hotel_id", alias = "hotelId")]
    id: Option<Value>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    city: Option<String>,
    #[serde(default, alias = "location")]
    address: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, alias = "price", alias = "pricePerNight")]
    price_per_night: Option<f64>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default, alias = "review_score")]
    rating: Option<f32>,
    #[serde(default)]
    amenities: Vec<String>,
}

impl ApiHotel {
    fn into_item(self, destination: &str) -> Option<HotelItem> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return None;
        }

        let id = match self.id {
            Some(Value::String(id)) if !id.is_empty() => id,
            Some(Value::Number(id)) => id.to_string(),
            _ => synthetic_id(&name, self.city.as_deref().unwrap_or(destination)),
        };

        Some(HotelItem {
            id,
            name,
            city: self.city.or_else(|| Some(destination.to_string())),
            address: self.address,
            country: self.country,
            description: self.description,
            price_per_night: self.price_per_night,
            currency: self.currency,
            rating: self.rating,
            amenities: self.amenities,
            score: None,
        })
    }
}

/// Stable id for records the API sends without one
fn synthetic_id(name: &str, city: &str) -> String {
    let slug: String = format!("{} {}", name, city)
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    let parts: Vec<&str> = slug.split('-').filter(|p| !p.is_empty()).collect();
    format!("api-{}", parts.join("-"))
}

/// Hotels may arrive as a bare array or wrapped in `hotels` / `data` / `results`
fn hotel_records(body: Value) -> Result<Vec<Value>> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => ["hotels", "data", "results"]
            .iter()
            .find_map(|field| match map.remove(*field) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .ok_or_else(|| TravelError::dependency(NAME, "response has no hotel list")),
        _ => Err(TravelError::dependency(NAME, "unexpected response shape")),
    }
}

/// `GET {base_url}/hotels/search?destination=..&limit=..`
#[derive(Debug, Clone)]
pub struct HttpHotelSearch {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpHotelSearch {
    /// `None` when no base URL is configured
    pub fn from_config(config: &HotelApiConfig, timeout: Duration) -> Result<Option<Self>> {
        let Some(base_url) = config.base_url.as_deref() else {
            return Ok(None);
        };
        Ok(Some(Self {
            client: build_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }))
    }
}

#[async_trait]
impl HotelSearchApi for HttpHotelSearch {
    async fn search_by_destination(
        &self,
        destination: &str,
        limit: usize,
    ) -> Result<Vec<HotelItem>> {
        let url = format!("{}/hotels/search", self.base_url);
        let limit_param = limit.to_string();
        let request = self
            .client
            .get(&url)
            .query(&[("destination", destination), ("limit", limit_param.as_str())]);
        let body = send_json(with_bearer(request, self.api_key.as_deref()), NAME).await?;

        let hotels: Vec<HotelItem> = hotel_records(body)?
            .into_iter()
            .filter_map(|record| serde_json::from_value::<ApiHotel>(record).ok())
            .filter_map(|hotel| hotel.into_item(destination))
            .take(limit)
            .collect();

        debug!("Hotel API returned {} hotels for {}", hotels.len(), destination);
        Ok(hotels)
    }

    fn name(&self) -> &str {
        NAME
    }
}
