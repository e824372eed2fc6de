//! `analyze`: review a transcript file.

use anyhow::{Context, Result};
use clap::Args;
use serde::Deserialize;
use std::path::PathBuf;

use crate::cli::output::output;
use crate::domain::models::{Config, Message, Speaker};

use super::review::ReviewOutput;

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// JSON array of messages: `[{"speaker": "them", "text": "hey"}, ...]`
    pub transcript: PathBuf,
}

/// Lenient transcript entry; ids and flags are filled in when missing.
#[derive(Debug, Deserialize)]
struct TranscriptEntry {
    #[serde(default)]
    id: Option<String>,
    speaker: Speaker,
    text: String,
    #[serde(default)]
    timestamp: Option<String>,
}

fn into_messages(entries: Vec<TranscriptEntry>) -> Vec<Message> {
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let id = entry.id.unwrap_or_else(|| format!("m{}", index + 1));
            let message = Message::new(id, entry.speaker, entry.text);
            match entry.timestamp {
                Some(ts) => message.with_timestamp(ts),
                None => message,
            }
        })
        .collect()
}

/// Parse a transcript document.
pub fn parse_transcript(body: &str) -> Result<Vec<Message>> {
    let entries: Vec<TranscriptEntry> =
        serde_json::from_str(body).context("Transcript must be a JSON array of messages")?;
    Ok(into_messages(entries))
}

pub async fn execute(args: AnalyzeArgs, config: &Config, json_mode: bool) -> Result<()> {
    let body = tokio::fs::read_to_string(&args.transcript)
        .await
        .with_context(|| format!("Failed to read {}", args.transcript.display()))?;
    let messages = parse_transcript(&body)?;

    let app = super::open_app(config).await?;
    let review = app.analyze_transcript(messages).await?;
    output(&ReviewOutput { review }, json_mode);
    Ok(())
}
