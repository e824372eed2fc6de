//! `practice`: interactive run against a persona on stdin.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::application::ReviewApp;
use crate::cli::output::{output, CommandOutput};
use crate::domain::errors::ErrorReport;
use crate::domain::models::{Config, PersonaTable, RunId, RunSnapshot, TURN_LIMIT};

use super::review::ReviewOutput;

/// Typing this ends the run without a review.
const QUIT: &str = "/quit";

#[derive(Args, Debug)]
pub struct PracticeArgs {
    /// Persona id (see `personas`); random when omitted
    #[arg(long)]
    pub persona: Option<String>,
}

/// Final state of a practice session.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeOutput {
    pub run: RunSnapshot,
    pub ended_early: bool,
    pub review_error: Option<ErrorReport>,
}

impl CommandOutput for PracticeOutput {
    fn to_human(&self) -> String {
        if self.ended_early {
            return format!(
                "Run ended after {} of {TURN_LIMIT} turns. No review.",
                self.run.turns_played
            );
        }
        match (&self.run.review, &self.review_error) {
            (Some(review), _) => ReviewOutput {
                review: review.clone(),
            }
            .to_human(),
            (None, Some(err)) => format!(
                "Run complete, but the review failed [{}]: {}",
                err.kind.as_str(),
                err.message
            ),
            (None, None) => "Run complete.".to_string(),
        }
    }
}

pub async fn execute(args: PracticeArgs, config: &Config, json_mode: bool) -> Result<()> {
    let app = super::open_app(config).await?;
    let run = app.start_run(args.persona.as_deref()).await?;
    let persona = PersonaTable
        .get(&run.persona_id)
        .context("Run started with an unknown persona")?;

    if !json_mode {
        println!(
            "{} {} ({}) is on the other end. {TURN_LIMIT} turns, {QUIT} to give up.\n",
            persona.avatar, persona.name, persona.vibe
        );
    }

    let result = play(&app, &run.run_id, persona.name, json_mode).await?;
    output(&result, json_mode);
    Ok(())
}

async fn play(app: &ReviewApp, run_id: &RunId, name: &str, quiet: bool) -> Result<PracticeOutput> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut review_error = None;

    loop {
        let snapshot = app.current_state(run_id).await?;
        if snapshot.turns_played >= TURN_LIMIT {
            return Ok(PracticeOutput {
                run: snapshot,
                ended_early: false,
                review_error,
            });
        }

        if !quiet {
            println!("[turn {}/{TURN_LIMIT}] you>", snapshot.turns_played + 1);
        }
        let line = lines.next_line().await.context("Failed to read stdin")?;
        let text = match line.as_deref().map(str::trim) {
            None | Some(QUIT) => {
                app.end_early(run_id).await?;
                return Ok(PracticeOutput {
                    run: snapshot,
                    ended_early: true,
                    review_error: None,
                });
            }
            Some("") => continue,
            Some(text) => text.to_string(),
        };

        let outcome = app.submit_user_message(run_id, &text).await?;
        if !quiet {
            println!("{name}: {}\n", outcome.reply.text);
        }
        review_error = outcome.review_error;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::demo_review;

    fn snapshot(turns_played: u32) -> RunSnapshot {
        RunSnapshot {
            run_id: RunId::from("r1"),
            persona_id: "dry".to_string(),
            state: crate::domain::models::RunState::InProgress { turns_played },
            turns_played,
            transcript: vec![],
            review: None,
        }
    }

    #[test]
    fn test_ended_early_summary() {
        let text = PracticeOutput {
            run: snapshot(2),
            ended_early: true,
            review_error: None,
        }
        .to_human();
        assert_eq!(text, "Run ended after 2 of 5 turns. No review.");
    }

    #[test]
    fn test_completed_run_prints_review() {
        let mut run = snapshot(5);
        run.review = Some(demo_review().unwrap());
        let text = PracticeOutput {
            run,
            ended_early: false,
            review_error: None,
        }
        .to_human();
        assert!(text.contains("Game Review:"));
    }
}
