//! Configuration loading
//!
//! Defaults, then `.message-chess/config.yaml` and `local.yaml`, then
//! `MESSAGE_CHESS_*` environment overrides, validated once at start.

pub mod loader;

pub use loader::{ConfigError, ConfigLoader, CONFIG_DIR, ENV_PREFIX};
