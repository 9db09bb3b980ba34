//! Test fixtures and data factories

use travel_rag::{Config, HotelItem};

/// Factory for hotel items
pub struct HotelFactory;

impl HotelFactory {
    /// Hotel in `city` with only the required fields
    pub fn in_city(id: &str, city: &str) -> HotelItem {
        HotelItem {
            id: id.to_string(),
            name: format!("Hotel {}", id),
            city: Some(city.to_string()),
            ..HotelItem::default()
        }
    }

    /// Fully described hotel
    pub fn detailed(id: &str, name: &str, city: &str, price: f64) -> HotelItem {
        HotelItem {
            id: id.to_string(),
            name: name.to_string(),
            city: Some(city.to_string()),
            address: None,
            country: Some("Mexico".to_string()),
            description: Some(format!("Stay at {} in {}", name, city)),
            price_per_night: Some(price),
            currency: Some("USD".to_string()),
            rating: Some(4.4),
            amenities: vec!["Pool".to_string(), "Beach access".to_string()],
            score: None,
        }
    }

    /// Mixed index: two Cancun hotels among others
    pub fn mixed_index() -> Vec<HotelItem> {
        vec![
            Self::in_city("lis-1", "Lisbon"),
            Self::detailed("cun-1", "Playa Azul", "Cancun", 180.0),
            Self::in_city("rom-1", "Rome"),
            Self::detailed("cun-2", "Laguna Suites", "Cancun", 140.0),
            Self::in_city("lis-2", "Lisbon"),
        ]
    }
}

/// Defaults with deadlines short enough for tests
pub fn fast_config() -> Config {
    let mut config = Config::default();
    config.retrieval.embedding_timeout_ms = 200;
    config.retrieval.vector_query_timeout_ms = 200;
    config.retrieval.hotel_api_timeout_ms = 200;
    config.rate_limit.window_ms = 10;
    config.lock.ttl_ms = 2_000;
    config.lock.wait_ms = 1_500;
    config.lock.poll_ms = 20;
    config.cache.durable_timeout_ms = 100;
    config
}
