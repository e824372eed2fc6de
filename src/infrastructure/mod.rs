//! Infrastructure layer module
//!
//! Process-wide concerns that are not adapters for a port:
//! - Configuration management (figment)
//! - Logging infrastructure (tracing)

pub mod config;
pub mod logging;
