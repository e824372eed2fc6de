use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::{CacheBackend, Config};

/// Directory holding project-local configuration and state
pub const CONFIG_DIR: &str = ".message-chess";

/// Prefix for environment overrides, e.g. `MESSAGE_CHESS_CACHE__ENABLED=false`
pub const ENV_PREFIX: &str = "MESSAGE_CHESS_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid timeout for {0}: must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("Invalid cache retention: must be at least one day")]
    ZeroRetention,

    #[error("Cache database path cannot be empty for the sqlite backend")]
    EmptyDatabasePath,

    #[error("Invalid upload limit: must be greater than zero")]
    ZeroUploadLimit,

    #[error("Invalid max_persona_failures: must be at least 1")]
    ZeroPersonaFailures,

    #[error("Invalid max_tokens: must be greater than zero")]
    ZeroMaxTokens,
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .message-chess/config.yaml
    /// 3. .message-chess/local.yaml (optional local overrides)
    /// 4. Environment variables (MESSAGE_CHESS_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(format!("{CONFIG_DIR}/config.yaml")))
            .merge(Yaml::file(format!("{CONFIG_DIR}/local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.synthesis.review_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("synthesis.review_timeout_secs"));
        }
        if config.oracle.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("oracle.request_timeout_secs"));
        }
        if config.oracle.max_tokens == 0 {
            return Err(ConfigError::ZeroMaxTokens);
        }

        if config.cache.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("cache.timeout_ms"));
        }
        if config.cache.retention_days == 0 {
            return Err(ConfigError::ZeroRetention);
        }
        if config.cache.backend == CacheBackend::Sqlite && config.cache.database_path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.runs.idle_ttl_secs == 0 {
            return Err(ConfigError::ZeroTimeout("runs.idle_ttl_secs"));
        }
        if config.runs.persona_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("runs.persona_timeout_secs"));
        }
        if config.runs.max_persona_failures == 0 {
            return Err(ConfigError::ZeroPersonaFailures);
        }

        if config.upload.max_bytes == 0 {
            return Err(ConfigError::ZeroUploadLimit);
        }

        Ok(())
    }
}
