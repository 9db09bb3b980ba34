//! Two pipelines sharing one durable store
//!
//! Each pipeline stands in for a separate process: its own in-process cache,
//! in-flight registry and fakes, with only the durable store in common.

#[cfg(test)]
mod tests {
    use crate::common::{HotelFactory, InMemoryIndex, Pipeline, fast_config, wait_until};
    use std::sync::Arc;
    use std::time::Duration;
    use travel_rag::core::retrieval::RetrievalQuery;
    use travel_rag::core::retrieval::orchestrator::LOCK_PREFIX;
    use travel_rag::core::traits::DurableStore;
    use travel_rag::storage::MemoryStore;
    use travel_rag::core::cache_manager::CacheStatus;
    use travel_rag::{Config, RetrievalSource, ServedFrom};

    fn replica(config: Config, store: Arc<MemoryStore>, delay: Duration) -> Pipeline {
        let index = Arc::new(InMemoryIndex::with_hotels(HotelFactory::mixed_index()));
        *index.delay.lock() = delay;
        Pipeline::builder(config).index(index).durable(store).build()
    }

    #[tokio::test]
    async fn test_result_computed_by_one_replica_is_served_by_another() {
        let store = Arc::new(MemoryStore::new());
        let a = replica(fast_config(), store.clone(), Duration::ZERO);
        let b = replica(fast_config(), store.clone(), Duration::ZERO);

        let computed = a.orchestrator.retrieve("hotels in Cancun", None).await.unwrap();
        assert_eq!(computed.served_from, ServedFrom::Computed);

        let shared = b.orchestrator.retrieve("hotels in Cancun", None).await.unwrap();
        assert_eq!(shared.served_from, ServedFrom::CacheFresh);
        assert_eq!(shared.result, computed.result);
        assert_eq!(b.index.queries(), 0);
        assert_eq!(b.embedder.calls(), 0);
        assert_eq!(b.orchestrator.stats().result_cache.l2_hits, 1);
    }

    #[tokio::test]
    async fn test_concurrent_replicas_compute_once() {
        let store = Arc::new(MemoryStore::new());
        let a = replica(fast_config(), store.clone(), Duration::from_millis(150));
        let b = replica(fast_config(), store.clone(), Duration::from_millis(150));

        let (ra, rb) = tokio::join!(
            a.orchestrator.retrieve("hotels in Cancun", None),
            b.orchestrator.retrieve("hotels in Cancun", None),
        );
        let (ra, rb) = (ra.unwrap(), rb.unwrap());
        assert_eq!(ra.hotels(), rb.hotels());
        assert_eq!(ra.result.source, RetrievalSource::VectorIndex);

        let (sa, sb) = (a.orchestrator.stats(), b.orchestrator.stats());
        assert_eq!(sa.retrieval.computations + sb.retrieval.computations, 1);
        assert_eq!(a.index.queries() + b.index.queries(), 1);
        assert_eq!(
            sa.single_flight.lock_acquired + sb.single_flight.lock_acquired,
            1
        );
        assert_eq!(sa.single_flight.poll_hits + sb.single_flight.poll_hits, 1);

        // The lock is released once the result is stored
        let key = RetrievalQuery::new("hotels in Cancun", 5).cache_key();
        assert!(!store.contains(&format!("{}:{}", LOCK_PREFIX, key)));
    }

    #[tokio::test]
    async fn test_abandoned_lock_delays_by_at_most_the_wait_timeout() {
        let mut config = fast_config();
        config.lock.wait_ms = 100;
        let store = Arc::new(MemoryStore::new());

        let key = RetrievalQuery::new("hotels in Cancun", 5).cache_key();
        let lock_key = format!("{}:{}", LOCK_PREFIX, key);
        let taken = store
            .set_if_absent(&lock_key, "crashed-replica", Duration::from_secs(30))
            .await
            .unwrap();
        assert!(taken);

        let pipeline = replica(config, store.clone(), Duration::ZERO);
        let started = tokio::time::Instant::now();
        let response = pipeline.orchestrator.retrieve("hotels in Cancun", None).await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(100));
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(response.served_from, ServedFrom::Computed);
        assert_eq!(response.hotels().len(), 2);

        let stats = pipeline.orchestrator.stats().single_flight;
        assert_eq!(stats.lock_contended, 1);
        assert_eq!(stats.poll_timeouts, 1);
        // Someone else's lock is left alone
        assert!(store.contains(&lock_key));
    }

    #[tokio::test]
    async fn test_refresh_under_foreign_lock_recomputes_instead_of_restamping() {
        let mut config = fast_config();
        config.cache.fresh_ms = 50;
        config.cache.stale_ms = 60_000;
        config.lock.wait_ms = 100;
        let store = Arc::new(MemoryStore::new());
        let pipeline = replica(config, store.clone(), Duration::ZERO);

        let first = pipeline.orchestrator.retrieve("hotels in Cancun", None).await.unwrap();
        assert_eq!(first.served_from, ServedFrom::Computed);

        let key = RetrievalQuery::new("hotels in Cancun", 5).cache_key();
        let lock_key = format!("{}:{}", LOCK_PREFIX, key);
        assert!(
            store
                .set_if_absent(&lock_key, "other-replica", Duration::from_secs(30))
                .await
                .unwrap()
        );

        tokio::time::sleep(Duration::from_millis(80)).await;
        pipeline
            .index
            .hotels
            .lock()
            .insert(0, HotelFactory::in_city("cun-new", "Cancun"));

        let stale = pipeline.orchestrator.retrieve("hotels in Cancun", None).await.unwrap();
        assert_eq!(stale.served_from, ServedFrom::CacheStale);

        let cache = pipeline.orchestrator.cache();
        assert!(
            wait_until(
                || !cache.is_revalidating(&key) && pipeline.index.queries() == 2,
                Duration::from_secs(2)
            )
            .await
        );

        // The stale entry was never accepted as the other replica's answer
        let flights = pipeline.orchestrator.stats().single_flight;
        assert_eq!(flights.poll_hits, 0);
        assert_eq!(flights.poll_timeouts, 1);

        let lookup = cache.get(&key).await;
        assert_eq!(lookup.status, CacheStatus::Fresh);
        let refreshed = lookup.value.unwrap();
        assert_eq!(refreshed.hotels[0].id, "cun-new");
        assert!(refreshed.generated_at_ms > first.result.generated_at_ms);
        assert_eq!(cache.stats().revalidation_failures, 0);
    }
}
