//! Common test utilities for integration tests
//!
//! Shared fixtures used across the integration test files.

use std::path::PathBuf;
use tempfile::TempDir;

use message_chess::domain::models::{CacheBackend, Config, Message, SynthesisStrategy};

/// Smallest byte string the upload check accepts as a PNG.
#[allow(dead_code)]
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];

/// JPEG start-of-image marker followed by junk.
#[allow(dead_code)]
pub const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 16, b'J', b'F', b'I', b'F'];

/// Create a temporary directory for test isolation
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Path to a cache database inside a fresh temp directory.
#[allow(dead_code)]
pub fn temp_db_path() -> (TempDir, PathBuf) {
    let dir = temp_dir();
    let db_path = dir.path().join("cache.db");
    (dir, db_path)
}

/// Initializes a tracing subscriber that writes through the test harness.
#[allow(dead_code)]
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Offline configuration: fixture reviews, mock personas, in-memory cache.
#[allow(dead_code)]
pub fn fixture_config() -> Config {
    let mut config = Config::default();
    config.synthesis.strategy = SynthesisStrategy::Fixture;
    config.cache.backend = CacheBackend::Memory;
    config
}

/// The short exchange used by the end-to-end checks.
#[allow(dead_code)]
pub fn short_transcript() -> Vec<Message> {
    vec![
        Message::from_them("1", "Hey! Still on for tonight?"),
        Message::from_you("2", "k"),
    ]
}
