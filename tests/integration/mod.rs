//! Integration tests for travel-rag
//!
//! These tests drive the public API across component boundaries with
//! in-memory fakes and mock HTTP servers; no external services are needed.

pub mod chat_tests;
pub mod config_tests;
pub mod distributed_tests;
pub mod resilience_tests;
pub mod retrieval_tests;
pub mod services_tests;
