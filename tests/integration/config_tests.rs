//! Configuration loading integration tests
//!
//! YAML file, then environment overrides, then validation.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use travel_rag::{Config, TravelError};

    const SAMPLE: &str = r#"
retrieval:
  embedding_timeout_ms: 2000
  default_top_k: 8
cache:
  fresh_ms: 300000
  stale_ms: 900000
lock:
  ttl_ms: 12000
storage:
  redis:
    url: redis://cache.internal:6379
  vector:
    url: http://qdrant.internal:6333
    collection: hotels_v2
providers:
  hotel_api:
    base_url: https://hotels.example.com/api
logging:
  level: debug
  json: true
"#;

    fn sample_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_file_values_and_defaults_combine() {
        let file = sample_file();
        let config = Config::from_file(file.path()).await.unwrap();

        assert_eq!(config.retrieval.embedding_timeout_ms, 2_000);
        assert_eq!(config.retrieval.default_top_k, 8);
        assert_eq!(config.retrieval.vector_query_timeout_ms, 1_500);
        assert_eq!(config.cache.fresh_ms, 300_000);
        assert_eq!(config.cache.max_size, 500);
        assert_eq!(config.storage.vector.collection, "hotels_v2");
        assert!(config.storage.redis.enabled);
        assert_eq!(
            config.providers.hotel_api.base_url.as_deref(),
            Some("https://hotels.example.com/api")
        );
        assert!(config.logging.json);
    }

    #[tokio::test]
    async fn test_environment_overrides_file_values() {
        let file = sample_file();
        let mut config = Config::from_file(file.path()).await.unwrap();

        let env: HashMap<&str, &str> = [
            ("RETRIEVAL_TOP_K", "3"),
            ("REDIS_ENABLED", "false"),
            ("QDRANT_COLLECTION", "hotels_v3"),
            ("HOTEL_API_MAX_REQUESTS", "2"),
        ]
        .into_iter()
        .collect();
        config
            .apply_overrides_from(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();
        config.validate().unwrap();

        assert_eq!(config.retrieval.default_top_k, 3);
        assert!(!config.storage.redis.enabled);
        assert_eq!(config.storage.vector.collection, "hotels_v3");
        assert_eq!(config.rate_limit.max_requests, 2);
        // Untouched file values survive
        assert_eq!(config.cache.stale_ms, 900_000);
    }

    #[tokio::test]
    async fn test_invalid_override_fails_validation() {
        let file = sample_file();
        let mut config = Config::from_file(file.path()).await.unwrap();

        config
            .apply_overrides_from(|name| (name == "QDRANT_URL").then(|| "qdrant:6333".to_string()))
            .unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, TravelError::Config(ref m) if m.starts_with("Storage config error")));
    }
}
