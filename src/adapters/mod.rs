//! Adapters for external systems: review caches and oracle backends.

pub mod cache;
pub mod oracles;
pub mod sqlite;
