//! Degradation integration tests
//!
//! Slow or failing dependencies must degrade answers, never block them.

#[cfg(test)]
mod tests {
    use crate::common::{
        CountingEmbedder, HotelFactory, InMemoryIndex, Pipeline, ScriptedHotelApi,
        UnreachableStore, fast_config, wait_until,
    };
    use std::sync::Arc;
    use std::sync::atomic::Ordering;
    use std::time::{Duration, Instant};
    use travel_rag::core::retrieval::{RetrievalQuery, RetrievalResult};
    use travel_rag::storage::MemoryStore;
    use travel_rag::utils::error::CircuitState;
    use travel_rag::{RetrievalSource, ServedFrom, TravelError};

    /// A hung embedding provider costs one deadline, then the hotel API answers
    #[tokio::test]
    async fn test_embedding_timeout_falls_back_to_hotel_api() {
        let pipeline = Pipeline::builder(fast_config())
            .embedder(CountingEmbedder::with_delay(Duration::from_secs(30)))
            .index(Arc::new(InMemoryIndex::with_hotels(HotelFactory::mixed_index())))
            .api(ScriptedHotelApi::with_hotels(vec![HotelFactory::in_city(
                "api-cun-1",
                "Cancun",
            )]))
            .build();

        let started = Instant::now();
        let response = pipeline.orchestrator.retrieve("hotels in Cancun", None).await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(response.result.source, RetrievalSource::ExternalApi);
        assert_eq!(response.hotels()[0].id, "api-cun-1");
        assert_eq!(pipeline.index.queries(), 0);
        assert_eq!(pipeline.orchestrator.stats().retrieval.vector_failures, 1);
    }

    /// An unreachable durable tier behaves like an empty one
    #[tokio::test]
    async fn test_unreachable_durable_store_is_a_miss() {
        let pipeline = Pipeline::builder(fast_config())
            .index(Arc::new(InMemoryIndex::with_hotels(HotelFactory::mixed_index())))
            .durable(Arc::new(UnreachableStore))
            .build();

        let first = pipeline.orchestrator.retrieve("hotels in Cancun", None).await.unwrap();
        assert_eq!(first.result.source, RetrievalSource::VectorIndex);
        assert_eq!(first.hotels().len(), 2);

        let second = pipeline.orchestrator.retrieve("hotels in Cancun", None).await.unwrap();
        assert_eq!(second.served_from, ServedFrom::CacheFresh);

        let stats = pipeline.orchestrator.stats();
        assert!(stats.result_cache.l2_errors >= 1);
        assert_eq!(stats.single_flight.lock_errors, 1);
        assert_eq!(stats.retrieval.computations, 1);
    }

    /// A stale entry is served at once and refreshed behind the caller
    #[tokio::test]
    async fn test_stale_entry_served_then_refreshed() {
        let mut config = fast_config();
        config.cache.fresh_ms = 50;
        config.cache.stale_ms = 60_000;
        let index = Arc::new(InMemoryIndex::with_hotels(HotelFactory::mixed_index()));
        let pipeline = Pipeline::builder(config)
            .index(index.clone())
            .durable(Arc::new(MemoryStore::new()))
            .build();

        pipeline.orchestrator.retrieve("hotels in Cancun", None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;

        index
            .hotels
            .lock()
            .insert(0, HotelFactory::in_city("cun-new", "Cancun"));

        let started = Instant::now();
        let stale = pipeline.orchestrator.retrieve("hotels in Cancun", None).await.unwrap();
        assert!(started.elapsed() < Duration::from_millis(50));
        assert_eq!(stale.served_from, ServedFrom::CacheStale);
        assert_eq!(stale.hotels()[0].id, "cun-1");

        assert!(wait_until(|| index.queries() == 2, Duration::from_secs(1)).await);
        let refreshed = wait_until(
            || pipeline.orchestrator.cache().stats().revalidations == 1,
            Duration::from_secs(1),
        )
        .await;
        assert!(refreshed);

        let mut fresh = None;
        for _ in 0..50 {
            let response = pipeline.orchestrator.retrieve("hotels in Cancun", None).await.unwrap();
            if response.served_from == ServedFrom::CacheFresh {
                fresh = Some(response);
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let fresh = fresh.expect("refreshed entry was not cached");
        assert_eq!(fresh.hotels()[0].id, "cun-new");
    }

    /// Slow embedder, unreachable durable tier and a stale entry in process:
    /// the stale entry is served without error and survives the failed refresh
    #[tokio::test]
    async fn test_stale_entry_served_through_embedding_timeout_and_durable_outage() {
        let pipeline = Pipeline::builder(fast_config())
            .embedder(CountingEmbedder::with_delay(Duration::from_millis(500)))
            .index(Arc::new(InMemoryIndex::with_hotels(HotelFactory::mixed_index())))
            .durable(Arc::new(UnreachableStore))
            .build();

        let query = RetrievalQuery::new("hotels in Cancun", 5);
        let seeded = RetrievalResult {
            query: query.text.clone(),
            top_k: query.top_k,
            hotels: vec![HotelFactory::detailed("cun-1", "Playa Azul", "Cancun", 180.0)],
            source: RetrievalSource::VectorIndex,
            destination: Some("Cancun".to_string()),
            generated_at_ms: 1,
        };
        let key = query.cache_key();
        pipeline
            .orchestrator
            .cache()
            .set_with(&key, seeded.clone(), Duration::ZERO)
            .await;

        let started = Instant::now();
        let response = pipeline.orchestrator.retrieve("hotels in Cancun", None).await.unwrap();
        assert!(started.elapsed() < Duration::from_millis(200));
        assert_eq!(response.served_from, ServedFrom::CacheStale);
        assert_eq!(response.result, seeded);

        // The refresh times out on the embedder, finds nothing better and
        // leaves the entry alone
        let cache = pipeline.orchestrator.cache();
        assert!(wait_until(|| cache.stats().revalidation_failures == 1, Duration::from_secs(2)).await);
        assert_eq!(cache.get_any(&key), Some(seeded));

        let stats = pipeline.orchestrator.stats();
        assert!(stats.result_cache.l2_errors >= 2);
        assert_eq!(stats.retrieval.vector_failures, 1);
        assert_eq!(pipeline.index.queries(), 0);
    }

    /// Repeated API failures open the breaker; later fallbacks skip the API
    #[tokio::test]
    async fn test_breaker_opens_after_repeated_api_failures() {
        let mut config = fast_config();
        config.circuit_breaker.failure_threshold = 2;
        let pipeline = Pipeline::builder(config)
            .index(Arc::new(InMemoryIndex::with_hotels(vec![
                HotelFactory::in_city("lis-1", "Lisbon"),
            ])))
            .api(ScriptedHotelApi::failing())
            .build();

        for city in ["Cancun", "Tulum", "Merida"] {
            let response = pipeline
                .orchestrator
                .retrieve(&format!("hotels in {}", city), None)
                .await
                .unwrap();
            assert_eq!(response.result.source, RetrievalSource::UnfilteredVector);
            assert_eq!(response.hotels()[0].id, "lis-1");
        }

        let api = pipeline.api.as_ref().unwrap();
        assert_eq!(api.calls(), 2);
        assert!(pipeline.orchestrator.breaker().is_open());
        assert_eq!(pipeline.orchestrator.breaker().state(), CircuitState::Open);

        let stats = pipeline.orchestrator.stats();
        assert_eq!(stats.retrieval.api_failures, 2);
        assert_eq!(stats.retrieval.api_skipped, 1);
        assert_eq!(stats.breaker.times_opened, 1);
    }

    /// Unfiltered fallbacks are not cached, so a recovered API is used next time
    #[tokio::test]
    async fn test_fallback_results_are_not_cached() {
        let pipeline = Pipeline::builder(fast_config())
            .index(Arc::new(InMemoryIndex::with_hotels(vec![
                HotelFactory::in_city("lis-1", "Lisbon"),
            ])))
            .api(ScriptedHotelApi::failing())
            .build();

        let degraded = pipeline.orchestrator.retrieve("hotels in Cancun", None).await.unwrap();
        assert_eq!(degraded.result.source, RetrievalSource::UnfilteredVector);

        let api = pipeline.api.as_ref().unwrap();
        api.fail.store(false, Ordering::SeqCst);
        api.hotels
            .lock()
            .push(HotelFactory::in_city("api-cun-1", "Cancun"));

        let recovered = pipeline.orchestrator.retrieve("hotels in Cancun", None).await.unwrap();
        assert_eq!(recovered.served_from, ServedFrom::Computed);
        assert_eq!(recovered.result.source, RetrievalSource::ExternalApi);
    }

    /// Index and API both down, nothing cached: a typed error
    #[tokio::test]
    async fn test_every_source_down_is_exhausted() {
        let index = Arc::new(InMemoryIndex::default());
        index.fail.store(true, Ordering::SeqCst);
        let pipeline = Pipeline::builder(fast_config())
            .index(index)
            .api(ScriptedHotelApi::failing())
            .build();

        let err = pipeline.orchestrator.retrieve("hotels in Cancun", None).await.unwrap_err();
        assert!(err.is_exhausted());
        assert!(matches!(err, TravelError::ExhaustedFallback(_)));
        assert_eq!(pipeline.orchestrator.stats().retrieval.exhausted, 1);
    }

    /// Past both windows, an outage still gets the last result seen
    #[tokio::test]
    async fn test_expired_entry_is_last_resort() {
        let mut config = fast_config();
        config.cache.fresh_ms = 20;
        config.cache.stale_ms = 20;
        let index = Arc::new(InMemoryIndex::with_hotels(HotelFactory::mixed_index()));
        let pipeline = Pipeline::builder(config).index(index.clone()).build();

        pipeline.orchestrator.retrieve("hotels in Cancun", None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        index.fail.store(true, Ordering::SeqCst);

        let response = pipeline.orchestrator.retrieve("hotels in Cancun", None).await.unwrap();
        assert_eq!(response.result.source, RetrievalSource::LastKnown);
        assert_eq!(response.hotels().len(), 2);
        assert!(response.is_degraded());
    }
}
