//! CLI command implementations.

pub mod analyze;
pub mod cache;
pub mod personas;
pub mod practice;
pub mod review;
pub mod validate;

use anyhow::{Context, Result};

use crate::application::ReviewApp;
use crate::domain::models::Config;

/// Build the application for a command.
pub(crate) async fn open_app(config: &Config) -> Result<ReviewApp> {
    ReviewApp::from_config(config)
        .await
        .context("Failed to set up the review pipeline")
}
