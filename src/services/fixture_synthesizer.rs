//! Offline synthesizer returning a canned review.

use async_trait::async_trait;
use tracing::debug;

use crate::domain::errors::DomainResult;
use crate::domain::models::{GameReview, Message, MoveLabel, Player, Players};
use crate::domain::ports::{ReviewSynthesizer, SynthesisRequest};
use crate::services::review_builder::{build, MoveJudgment, ReviewDraft};
use crate::services::schema_validator::validate;

/// Id of the canned review.
pub const DEMO_REVIEW_ID: &str = "demo-fixture";

/// The canned review: a short dinner-plan chat that opens with a one-letter
/// blunder and recovers.
pub fn demo_review() -> DomainResult<GameReview> {
    let messages = vec![
        Message::from_them("m1", "Hey! Still on for tonight?").with_timestamp("18:02"),
        Message::from_you("m2", "k").with_timestamp("18:40"),
        Message::from_them("m3", "...okay then. Nevermind.").with_timestamp("18:41"),
        Message::from_you("m4", "Sorry, long day! Sushi at 7, my treat?").with_timestamp("18:45"),
        Message::from_them("m5", "Haha okay fine. 7pm?").with_timestamp("18:46"),
        Message::from_you("m6", "7pm works! See you there").with_timestamp("18:46"),
    ];

    let judgments = vec![
        MoveJudgment::new(
            "m2",
            MoveLabel::Blunder,
            -1.25,
            "A single letter in reply to an excited question reads as annoyed. Momentum drops immediately.",
        )
        .with_suggestion(
            "Yes! Can't wait. Still 7?",
            "Matches their energy and confirms the plan in one move.",
        )
        .with_headline("The One-Letter Collapse"),
        MoveJudgment::new(
            "m4",
            MoveLabel::BrilliantMove,
            2.5,
            "Owns the slip, explains it briefly and turns it into a concrete, generous offer.",
        )
        .with_headline("The Sushi Sacrifice"),
        MoveJudgment::new(
            "m6",
            MoveLabel::GoodMove,
            0.25,
            "Clean confirmation. Nothing flashy, nothing lost.",
        ),
    ];

    build(ReviewDraft {
        id: DEMO_REVIEW_ID.to_string(),
        created_at: "2024-01-01T00:00:00Z".to_string(),
        messages,
        players: Players {
            you: Player::new("You", 72.0),
            them: Player::new("Them", 88.0),
        },
        opening_name: None,
        overall_coach_summary: "You opened with a blunder that nearly ended the game, then found \
            a brilliant recovery. Lead with warmth next time and you won't need the comeback."
            .to_string(),
        judgments,
        suggested_next_move: Some("Looking forward to it! I'll grab us a table by the window.".to_string()),
    })
}

/// Synthesizer that ignores its input and returns the canned review.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureSynthesizer;

impl FixtureSynthesizer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ReviewSynthesizer for FixtureSynthesizer {
    fn name(&self) -> &'static str {
        "fixture"
    }

    async fn synthesize(&self, request: SynthesisRequest) -> DomainResult<GameReview> {
        request.check_input()?;
        debug!(mode = request.mode().as_str(), "Serving canned review");
        Ok(validate(demo_review()?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::DomainError;
    use crate::domain::models::{ImageFormat, ScreenshotRef};

    #[tokio::test]
    async fn test_fixture_ignores_input() {
        let synthesizer = FixtureSynthesizer::new();
        let a = synthesizer
            .synthesize(SynthesisRequest::transcript(vec![Message::from_you("x", "hello")]))
            .await
            .unwrap();
        let b = synthesizer
            .synthesize(SynthesisRequest::screenshot(ScreenshotRef::from_bytes(
                ImageFormat::Png,
                b"\x89PNG",
            )))
            .await
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.id, DEMO_REVIEW_ID);
    }

    #[tokio::test]
    async fn test_fixture_rejects_empty_input() {
        let err = FixtureSynthesizer::new()
            .synthesize(SynthesisRequest::transcript(vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Input(_)));
    }

    #[test]
    fn test_demo_review_shape() {
        let review = demo_review().unwrap();
        assert_eq!(review.message_reviews[0].label, MoveLabel::Blunder);
        assert_eq!(review.eval_series.len(), review.message_reviews.len() + 1);
        assert_eq!(review.final_eval(), 1.5);
        assert_eq!(review.opening_name, "Dry Texter Defense");
        assert_eq!(review.suggested_replies.len(), 1);
        assert!(review.critical_moments.len() <= 3);
    }
}
