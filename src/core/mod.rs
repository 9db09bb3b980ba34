//! Core functionality for the travel assistant
//!
//! Retrieval pipeline, its resilience building blocks and the chat layer on top.

pub mod cache_manager;
pub mod chat;
pub mod providers;
pub mod rate_limiter;
pub mod retrieval;
pub mod single_flight;
pub mod traits;
