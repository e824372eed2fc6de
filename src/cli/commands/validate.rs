//! `validate`: check a stored review against the schema invariants.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::output::{output, CommandOutput};
use crate::domain::errors::{DomainError, SchemaViolation};
use crate::domain::models::GameReview;
use crate::services::validate;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Review JSON file
    pub review: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct ValidationOutput {
    pub valid: bool,
    pub id: String,
    pub moves: usize,
}

impl CommandOutput for ValidationOutput {
    fn to_human(&self) -> String {
        format!("OK: review {} is valid ({} moves)", self.id, self.moves)
    }
}

/// Parse and validate a review document.
pub fn check(body: &str) -> Result<GameReview, SchemaViolation> {
    let review: GameReview =
        serde_json::from_str(body).map_err(|e| SchemaViolation::Malformed(e.to_string()))?;
    validate(review)
}

pub async fn execute(args: ValidateArgs, json_mode: bool) -> Result<()> {
    let body = tokio::fs::read_to_string(&args.review)
        .await
        .with_context(|| format!("Failed to read {}", args.review.display()))?;

    let review = check(&body).map_err(DomainError::from)?;
    output(
        &ValidationOutput {
            valid: true,
            moves: review.move_count(),
            id: review.id,
        },
        json_mode,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::demo_review;

    #[test]
    fn test_check_accepts_valid_review() {
        let body = serde_json::to_string(&demo_review().unwrap()).unwrap();
        assert_eq!(check(&body).unwrap().move_count(), 3);
    }

    #[test]
    fn test_check_names_the_violation() {
        let mut review = demo_review().unwrap();
        review.players.them.accuracy = 140.0;
        let body = serde_json::to_string(&review).unwrap();
        assert!(matches!(
            check(&body).unwrap_err(),
            SchemaViolation::AccuracyOutOfRange { .. }
        ));

        assert!(matches!(check("{}").unwrap_err(), SchemaViolation::Malformed(_)));
    }
}
