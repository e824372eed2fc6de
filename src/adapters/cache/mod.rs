//! In-memory review cache.

pub mod memory_review_cache;

pub use memory_review_cache::InMemoryReviewCache;
