//! Application layer: configuration-driven wiring and the review facade.

pub mod review_app;
pub mod wiring;

pub use review_app::ReviewApp;
pub use wiring::{assemble, build_synthesis, open_cache, resolve_strategy, Components};
