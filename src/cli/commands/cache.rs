//! `cache`: review cache maintenance.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::application::open_cache;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;

#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommands,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Delete entries past the retention window
    Purge,
}

#[derive(Debug, Serialize)]
pub struct PurgeOutput {
    pub purged: u64,
    pub retention_days: u32,
}

impl CommandOutput for PurgeOutput {
    fn to_human(&self) -> String {
        format!(
            "Purged {} review(s) older than {} days.",
            self.purged, self.retention_days
        )
    }
}

pub async fn execute(args: CacheArgs, config: &Config, json_mode: bool) -> Result<()> {
    match args.command {
        CacheCommands::Purge => {
            let purged = open_cache(&config.cache).await.purge_expired().await?;
            output(
                &PurgeOutput {
                    purged,
                    retention_days: config.cache.retention_days,
                },
                json_mode,
            );
        }
    }
    Ok(())
}
