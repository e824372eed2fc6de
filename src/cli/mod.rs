//! Command-line interface.

pub mod commands;
pub mod output;
pub mod table;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::domain::errors::{DomainError, ErrorKind};
use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;

use commands::{
    analyze::AnalyzeArgs, cache::CacheArgs, practice::PracticeArgs, review::ReviewArgs,
    validate::ValidateArgs,
};

#[derive(Parser, Debug)]
#[command(name = "message-chess", version, about = "Chess-engine style reviews for text conversations")]
pub struct Cli {
    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Read configuration from this file instead of .message-chess/
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Review a conversation screenshot (PNG or JPEG)
    Review(ReviewArgs),
    /// Review a transcript stored as a JSON array of messages
    Analyze(AnalyzeArgs),
    /// Play a five-turn practice conversation against a persona
    Practice(PracticeArgs),
    /// List the practice personas
    Personas,
    /// Check a review JSON file against the schema invariants
    Validate(ValidateArgs),
    /// Review cache maintenance
    Cache(CacheArgs),
}

/// Load configuration from `--config` or the project directory.
pub fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

#[derive(Debug, Serialize)]
struct ErrorOutput {
    error: ErrorKind,
    message: String,
}

/// Print an error and exit with status 1.
///
/// Domain errors keep their stable kind tag; anything else is reported as
/// internal.
pub fn handle_error(err: &anyhow::Error, json_mode: bool) -> ! {
    let (kind, message) = err.downcast_ref::<DomainError>().map_or_else(
        || (ErrorKind::Internal, format!("{err:#}")),
        |domain| {
            let report = domain.report();
            (report.kind, report.message)
        },
    );

    if json_mode {
        let body = ErrorOutput {
            error: kind,
            message,
        };
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("error [{}]: {message}", kind.as_str());
    }
    std::process::exit(1)
}
