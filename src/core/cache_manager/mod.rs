//! Tiered result cache
//!
//! In-process LRU (L1) in front of an optional shared durable tier (L2), with
//! fresh and stale windows and stale-while-revalidate refresh.

pub mod manager;
pub mod types;


pub use manager::{Cacheable, TieredCache};
pub use types::{CacheEntry, CacheLookup, CacheSettings, CacheStats, CacheStatus};
