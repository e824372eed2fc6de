//! `review`: screenshot reviews, and the review printer shared by commands.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::output::{output, signed, CommandOutput};
use crate::cli::table::TableFormatter;
use crate::domain::models::{Config, GameReview};

#[derive(Args, Debug)]
pub struct ReviewArgs {
    /// Screenshot of the conversation
    pub image: PathBuf,

    /// Skip the review cache
    #[arg(long)]
    pub no_cache: bool,
}

/// A finished review. JSON output is the review itself.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct ReviewOutput {
    pub review: GameReview,
}

impl CommandOutput for ReviewOutput {
    fn to_human(&self) -> String {
        let review = &self.review;
        let tables = TableFormatter::new();

        let mut lines = vec![
            format!("Game Review: {}", review.opening_name),
            format!(
                "{} ({:.0}% accuracy) vs {} ({:.0}% accuracy)",
                review.players.you.name,
                review.players.you.accuracy,
                review.players.them.name,
                review.players.them.accuracy
            ),
            format!("Final eval: {}", signed(review.final_eval())),
            String::new(),
            review.overall_coach_summary.clone(),
            String::new(),
            tables.format_moves(review),
        ];

        if !review.critical_moments.is_empty() {
            lines.push("\nCritical moments:".to_string());
            for moment in &review.critical_moments {
                lines.push(format!(
                    "  Move {} [{}] {}: {}",
                    moment.move_number, moment.label, moment.headline, moment.explanation
                ));
                if !moment.better_line.is_empty() {
                    lines.push(format!("    Better: {}", moment.better_line));
                }
            }
        }

        if !review.suggested_replies.is_empty() {
            lines.push("\nSuggested replies:".to_string());
            for reply in &review.suggested_replies {
                lines.push(format!(
                    "  Move {}: \"{}\" -> \"{}\"",
                    reply.move_number, reply.original, reply.suggestion
                ));
                lines.push(format!("    {}", reply.reason));
            }
        }

        lines.push(String::new());
        lines.push(tables.format_label_counts(review));

        if let Some(next) = &review.suggested_next_move {
            lines.push(format!("\nSuggested next move: {next}"));
        }

        lines.join("\n")
    }
}

pub async fn execute(args: ReviewArgs, config: &Config, json_mode: bool) -> Result<()> {
    let bytes = tokio::fs::read(&args.image)
        .await
        .with_context(|| format!("Failed to read {}", args.image.display()))?;

    let app = super::open_app(config).await?;
    let review = if args.no_cache {
        app.synthesize_from_image_uncached(&bytes).await?
    } else {
        app.synthesize_from_image(&bytes).await?
    };

    output(&ReviewOutput { review }, json_mode);
    Ok(())
}
