//! Service wiring against mock HTTP backends
//!
//! `AppServices::from_config` with Redis disabled, the vector store and the
//! embedding API served by wiremock.

#[cfg(test)]
mod tests {
    use serde_json::json;
    use travel_rag::{AppServices, Config, RetrievalSource};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mock_backends(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/collections/hotels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {"status": "green"}, "status": "ok"
            })))
            .mount(server)
            .await;

        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"embedding": [0.1, 0.2, 0.3], "index": 0}]
            })))
            .mount(server)
            .await;

        Mock::given(method("POST"))
            .and(path("/collections/hotels/points/search"))
            .and(body_partial_json(json!({"with_payload": true})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": [
                    {
                        "id": "0b7c1a38-0000-5000-8000-000000000001",
                        "score": 0.93,
                        "payload": {
                            "item_id": "cun-1",
                            "name": "Playa Azul",
                            "city": "Cancun",
                            "price_per_night": 180.0
                        }
                    },
                    {
                        "id": "0b7c1a38-0000-5000-8000-000000000002",
                        "score": 0.90,
                        "payload": {"item_id": "lis-1", "name": "Alfama Rooms", "city": "Lisbon"}
                    }
                ]
            })))
            .mount(server)
            .await;
    }

    fn config_for(server: &MockServer) -> Config {
        let mut config = Config::default();
        config.storage.redis.enabled = false;
        config.storage.vector.url = server.uri();
        config.providers.embedding.base_url = server.uri();
        config.providers.completion.base_url = server.uri();
        config
    }

    #[tokio::test]
    async fn test_services_answer_queries_without_redis() {
        let server = MockServer::start().await;
        mock_backends(&server).await;

        let services = AppServices::from_config(&config_for(&server)).await.unwrap();
        assert!(!services.has_durable_tier());

        let response = services
            .orchestrator()
            .retrieve("hotels in Cancun", None)
            .await
            .unwrap();
        assert_eq!(response.result.source, RetrievalSource::VectorIndex);
        assert_eq!(response.hotels().len(), 1);
        assert_eq!(response.hotels()[0].id, "cun-1");
        assert_eq!(response.hotels()[0].name, "Playa Azul");

        // No completion key: the reply is the formatted list
        let reply = services.chat().respond("s1", "hotels in Cancun").await.unwrap();
        assert!(!reply.degraded);
        assert!(reply.reply.contains("1. Playa Azul (Cancun)"));
        assert!(reply.reply.contains("$180/night"));

        let stats = services.stats();
        assert_eq!(stats.retrieval.retrieval.computations, 1);
        assert_eq!(stats.chat.replies, 1);
        assert_eq!(stats.active_sessions, 1);
    }

    #[tokio::test]
    async fn test_health_reports_each_store() {
        let server = MockServer::start().await;
        mock_backends(&server).await;

        let services = AppServices::from_config(&config_for(&server)).await.unwrap();
        let health = services.health_check().await;

        assert!(health.vector);
        assert!(!health.durable);
        assert!(!health.hotel_api_circuit_open);
        assert!(health.is_healthy());
    }

    #[tokio::test]
    async fn test_unreachable_vector_store_is_unhealthy_but_constructs() {
        let server = MockServer::start().await;
        let mut config = config_for(&server);
        config.storage.vector.url = "http://127.0.0.1:1".to_string();

        let services = AppServices::from_config(&config).await.unwrap();
        let health = services.health_check().await;
        assert!(!health.vector);
        assert!(!health.is_healthy());
    }
}
