use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure for message-chess
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Review synthesis strategy and timeouts
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// Reasoning / persona oracle backend
    #[serde(default)]
    pub oracle: OracleConfig,

    /// Result cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Practice run configuration
    #[serde(default)]
    pub runs: RunsConfig,

    /// Screenshot upload limits
    #[serde(default)]
    pub upload: UploadConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which synthesizer implementation to wire up at start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisStrategy {
    /// Oracle when an API key is available, fixture otherwise
    #[default]
    Auto,
    /// Canned review, no network
    Fixture,
    /// External reasoning oracle
    Oracle,
}

/// Review synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SynthesisConfig {
    #[serde(default)]
    pub strategy: SynthesisStrategy,

    /// Upper bound on a single review oracle call
    #[serde(default = "default_review_timeout_secs")]
    pub review_timeout_secs: u64,
}

const fn default_review_timeout_secs() -> u64 {
    120
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            strategy: SynthesisStrategy::default(),
            review_timeout_secs: default_review_timeout_secs(),
        }
    }
}

/// Oracle backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleType {
    #[default]
    AnthropicApi,
    Mock,
}

impl OracleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AnthropicApi => "anthropic_api",
            Self::Mock => "mock",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "anthropic_api" => Some(Self::AnthropicApi),
            "mock" => Some(Self::Mock),
            _ => None,
        }
    }
}

/// Oracle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OracleConfig {
    #[serde(default, rename = "type")]
    pub oracle_type: OracleType,

    /// API key; falls back to `ANTHROPIC_API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for screenshot and run reviews
    #[serde(default = "default_review_model")]
    pub review_model: String,

    /// Model used for persona replies
    #[serde(default = "default_persona_model")]
    pub persona_model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// HTTP request timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_review_model() -> String {
    "claude-sonnet-4-5".to_string()
}

fn default_persona_model() -> String {
    "claude-haiku-4-5".to_string()
}

const fn default_max_tokens() -> u32 {
    8192
}

const fn default_request_timeout_secs() -> u64 {
    180
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            oracle_type: OracleType::default(),
            api_key: None,
            base_url: default_base_url(),
            review_model: default_review_model(),
            persona_model: default_persona_model(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl OracleConfig {
    /// Get API key from config or environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok().filter(|k| !k.is_empty()))
    }
}

/// Cache storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    #[default]
    Sqlite,
    Memory,
}

/// Result cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CacheConfig {
    /// Disable to always call the oracle
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub backend: CacheBackend,

    /// `SQLite` database file for the sqlite backend
    #[serde(default = "default_cache_path")]
    pub database_path: String,

    /// Entries older than this are treated as missing
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// Upper bound on a single cache read or write
    #[serde(default = "default_cache_timeout_ms")]
    pub timeout_ms: u64,
}

const fn default_true() -> bool {
    true
}

fn default_cache_path() -> String {
    ".message-chess/cache.db".to_string()
}

const fn default_retention_days() -> u32 {
    7
}

const fn default_cache_timeout_ms() -> u64 {
    2_000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CacheBackend::default(),
            database_path: default_cache_path(),
            retention_days: default_retention_days(),
            timeout_ms: default_cache_timeout_ms(),
        }
    }
}

/// Practice run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RunsConfig {
    /// Runs idle for longer than this are evicted
    #[serde(default = "default_idle_ttl_secs")]
    pub idle_ttl_secs: u64,

    /// Upper bound on a single persona reply
    #[serde(default = "default_persona_timeout_secs")]
    pub persona_timeout_secs: u64,

    /// Consecutive persona failures before a turn is failed instead of
    /// answered with the placeholder reply
    #[serde(default = "default_max_persona_failures")]
    pub max_persona_failures: u32,
}

const fn default_idle_ttl_secs() -> u64 {
    3_600
}

const fn default_persona_timeout_secs() -> u64 {
    30
}

const fn default_max_persona_failures() -> u32 {
    2
}

impl Default for RunsConfig {
    fn default() -> Self {
        Self {
            idle_ttl_secs: default_idle_ttl_secs(),
            persona_timeout_secs: default_persona_timeout_secs(),
            max_persona_failures: default_max_persona_failures(),
        }
    }
}

/// Screenshot upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UploadConfig {
    #[serde(default = "default_max_upload_bytes")]
    pub max_bytes: usize,
}

const fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_upload_bytes(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rotated log files; stdout only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}
