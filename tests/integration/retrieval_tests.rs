//! Retrieval pipeline integration tests
//!
//! Drive `RetrievalOrchestrator::retrieve` end to end against counting fakes.

#[cfg(test)]
mod tests {
    use crate::common::{HotelFactory, InMemoryIndex, Pipeline, ScriptedHotelApi, fast_config};
    use futures::future::join_all;
    use std::sync::Arc;
    use tokio_test::assert_ok;
    use travel_rag::storage::MemoryStore;
    use travel_rag::{RetrievalSource, ServedFrom, TravelError};

    /// Concurrent identical queries share one embedding and one index query
    #[tokio::test]
    async fn test_concurrent_identical_queries_compute_once() {
        let index = Arc::new(InMemoryIndex::with_hotels(HotelFactory::mixed_index()));
        *index.delay.lock() = std::time::Duration::from_millis(50);
        let pipeline = Pipeline::builder(fast_config()).index(index).build();

        let responses = join_all((0..20).map(|_| {
            let orchestrator = pipeline.orchestrator.clone();
            async move { orchestrator.retrieve("hotels in Cancun", None).await }
        }))
        .await;

        assert_eq!(pipeline.embedder.calls(), 1);
        assert_eq!(pipeline.index.queries(), 1);

        let first = responses[0].as_ref().unwrap();
        for response in &responses {
            let response = response.as_ref().unwrap();
            assert_eq!(response.result, first.result);
        }

        let stats = pipeline.orchestrator.stats();
        assert_eq!(stats.retrieval.computations, 1);
        assert_eq!(stats.single_flight.leaders, 1);
        assert_eq!(stats.single_flight.followers, 19);
    }

    /// "hotels in Cancun" returns only Cancun hotels, best first, then hits the cache
    #[tokio::test]
    async fn test_cancun_query_end_to_end() {
        let index = Arc::new(InMemoryIndex::with_hotels(HotelFactory::mixed_index()));
        let pipeline = Pipeline::builder(fast_config())
            .index(index)
            .durable(Arc::new(MemoryStore::new()))
            .build();

        let response = assert_ok!(pipeline.orchestrator.retrieve("hotels in Cancun", None).await);
        assert_eq!(response.served_from, ServedFrom::Computed);
        assert_eq!(response.result.source, RetrievalSource::VectorIndex);
        assert_eq!(response.result.destination.as_deref(), Some("Cancun"));
        let ids: Vec<&str> = response.hotels().iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["cun-1", "cun-2"]);
        assert!(response.hotels()[0].score > response.hotels()[1].score);
        assert_eq!(response.hotels()[0].price_per_night, Some(180.0));

        // Whitespace and case variants share the cache entry
        let again = assert_ok!(pipeline.orchestrator.retrieve("  Hotels in CANCUN ", None).await);
        assert_eq!(again.served_from, ServedFrom::CacheFresh);
        assert_eq!(again.hotels(), response.hotels());
        assert_eq!(pipeline.index.queries(), 1);
    }

    /// Different result sizes are cached separately
    #[tokio::test]
    async fn test_top_k_is_part_of_the_cache_key() {
        let index = Arc::new(InMemoryIndex::with_hotels(HotelFactory::mixed_index()));
        let pipeline = Pipeline::builder(fast_config()).index(index).build();

        let one = pipeline.orchestrator.retrieve("hotels in Cancun", Some(1)).await.unwrap();
        let five = pipeline.orchestrator.retrieve("hotels in Cancun", Some(5)).await.unwrap();

        assert_eq!(one.hotels().len(), 1);
        assert_eq!(five.hotels().len(), 2);
        assert_eq!(five.served_from, ServedFrom::Computed);
        assert_eq!(pipeline.index.queries(), 2);
        // The embedding is reused across result sizes
        assert_eq!(pipeline.embedder.calls(), 1);
    }

    /// An index without the destination falls through to the hotel API
    #[tokio::test]
    async fn test_destination_missing_from_index_uses_hotel_api() {
        let index = Arc::new(InMemoryIndex::with_hotels(vec![
            HotelFactory::in_city("lis-1", "Lisbon"),
            HotelFactory::in_city("rom-1", "Rome"),
        ]));
        let pipeline = Pipeline::builder(fast_config())
            .index(index)
            .api(ScriptedHotelApi::with_hotels(vec![
                HotelFactory::in_city("api-cun-1", "Cancun"),
                HotelFactory::in_city("api-tul-1", "Tulum"),
            ]))
            .build();

        let response = pipeline.orchestrator.retrieve("hotels in Cancun", None).await.unwrap();

        assert_eq!(response.result.source, RetrievalSource::ExternalApi);
        assert_eq!(response.hotels().len(), 1);
        assert_eq!(response.hotels()[0].id, "api-cun-1");
        assert_eq!(pipeline.api.as_ref().unwrap().calls(), 1);

        let indexed = crate::common::wait_until(
            || !pipeline.index.upserted.lock().is_empty(),
            std::time::Duration::from_secs(1),
        )
        .await;
        assert!(indexed, "API results were not indexed");
        assert_eq!(pipeline.index.upserted.lock()[0].id, "api-cun-1");
    }

    /// Queries without a destination are not filtered
    #[tokio::test]
    async fn test_query_without_destination_returns_top_candidates() {
        let index = Arc::new(InMemoryIndex::with_hotels(HotelFactory::mixed_index()));
        let pipeline = Pipeline::builder(fast_config()).index(index).build();

        let response = pipeline
            .orchestrator
            .retrieve("quiet boutique hotel", Some(3))
            .await
            .unwrap();

        assert_eq!(response.result.source, RetrievalSource::VectorIndex);
        assert_eq!(response.result.destination, None);
        let ids: Vec<&str> = response.hotels().iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["lis-1", "cun-1", "rom-1"]);
    }

    #[tokio::test]
    async fn test_blank_query_is_rejected() {
        let pipeline = Pipeline::builder(fast_config()).build();
        let err = pipeline.orchestrator.retrieve(" \t ", None).await.unwrap_err();
        assert!(matches!(err, TravelError::Validation(_)));
        assert_eq!(pipeline.embedder.calls(), 0);
    }
}
