//! Logging infrastructure
//!
//! Structured logging with tracing-subscriber: an env-filtered console layer
//! (pretty or JSON, on stderr) and an optional JSON file layer rotated by
//! tracing-appender.

pub mod config;
pub mod logger;

pub use config::{LogConfig, LogFormat, RotationPolicy};
pub use logger::{LoggerImpl, LOG_FILE_NAME};
