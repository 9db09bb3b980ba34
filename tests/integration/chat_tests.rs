//! Chat integration tests
//!
//! A conversation on top of a real orchestrator and conversation store.

#[cfg(test)]
mod tests {
    use crate::common::{EchoCompletion, HotelFactory, InMemoryIndex, Pipeline, fast_config};
    use std::sync::Arc;
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use travel_rag::core::chat::DEGRADED_REPLY;
    use travel_rag::core::traits::{ChatRole, CompletionProvider};
    use travel_rag::{ChatService, ConversationStore, RetrievalSource};

    fn chat(pipeline: &Pipeline, completion: Option<Arc<EchoCompletion>>) -> ChatService {
        ChatService::new(
            pipeline.orchestrator.clone(),
            completion.map(|c| c as Arc<dyn CompletionProvider>),
            ConversationStore::new(6, Duration::from_secs(60)),
            Duration::from_millis(200),
        )
    }

    #[tokio::test]
    async fn test_conversation_keeps_destination_across_turns() {
        let pipeline = Pipeline::builder(fast_config())
            .index(Arc::new(InMemoryIndex::with_hotels(HotelFactory::mixed_index())))
            .build();
        let completion = Arc::new(EchoCompletion::default());
        let chat = chat(&pipeline, Some(completion.clone()));

        let first = chat.respond("trip-1", "hotels in Cancun").await.unwrap();
        assert_eq!(first.reply, "I found 2 hotels for \"hotels in Cancun\"");
        assert_eq!(first.source, Some(RetrievalSource::VectorIndex));
        assert!(!first.degraded);

        let follow_up = chat.respond("trip-1", "any with a pool?").await.unwrap();
        let ids: Vec<&str> = follow_up.hotels.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["cun-1", "cun-2"]);

        let requests = completion.requests.lock();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].history.len(), 2);
        assert_eq!(requests[1].history[0].role, ChatRole::User);
        assert_eq!(requests[1].history[1].role, ChatRole::Assistant);
    }

    #[tokio::test]
    async fn test_sessions_do_not_share_history() {
        let pipeline = Pipeline::builder(fast_config())
            .index(Arc::new(InMemoryIndex::with_hotels(HotelFactory::mixed_index())))
            .build();
        let chat = chat(&pipeline, None);

        chat.respond("alice", "hotels in Cancun").await.unwrap();
        chat.respond("bob", "hotels in Lisbon").await.unwrap();

        assert_eq!(chat.sessions().history("alice").len(), 2);
        assert_eq!(chat.sessions().history("alice")[0].content, "hotels in Cancun");
        assert_eq!(chat.sessions().history("bob")[0].content, "hotels in Lisbon");
        assert_eq!(chat.sessions().len(), 2);
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let pipeline = Pipeline::builder(fast_config())
            .index(Arc::new(InMemoryIndex::with_hotels(HotelFactory::mixed_index())))
            .build();
        let chat = chat(&pipeline, None);

        for i in 0..5 {
            chat.respond("s", &format!("hotels in Lisbon {}", i)).await.unwrap();
        }
        let history = chat.sessions().history("s");
        assert_eq!(history.len(), 6);
        assert_eq!(history[0].content, "hotels in Lisbon 2");
    }

    #[tokio::test]
    async fn test_outage_yields_apology_not_error() {
        let index = Arc::new(InMemoryIndex::default());
        index.fail.store(true, Ordering::SeqCst);
        let pipeline = Pipeline::builder(fast_config()).index(index).build();
        let chat = chat(&pipeline, Some(Arc::new(EchoCompletion::default())));

        let reply = chat.respond("s", "hotels in Cancun").await.unwrap();
        assert_eq!(reply.reply, DEGRADED_REPLY);
        assert!(reply.degraded);
        assert_eq!(chat.stats().degraded, 1);
        assert_eq!(chat.sessions().history("s").len(), 2);
    }
}
