//! Oracle-backed review synthesis.
//!
//! The oracle's answer is untrusted text. It is parsed, stamped with our own
//! id and timestamp, validated, and repaired when only derived fields are
//! wrong. Anything else earns one corrective follow-up before the request
//! fails with a synthesis error.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult, SchemaViolation};
use crate::domain::models::GameReview;
use crate::domain::ports::{ReviewOracle, ReviewPrompt, ReviewSynthesizer, SynthesisRequest};
use crate::services::review_builder::rederive;
use crate::services::review_prompts;
use crate::services::schema_validator::validate;

/// Synthesizer that delegates judgment to a review oracle.
pub struct OracleSynthesizer {
    oracle: Arc<dyn ReviewOracle>,
    timeout: Duration,
}

impl OracleSynthesizer {
    pub fn new(oracle: Arc<dyn ReviewOracle>, timeout: Duration) -> Self {
        Self { oracle, timeout }
    }

    /// Call the oracle, retrying once on a transient failure.
    async fn call_oracle(&self, prompt: &ReviewPrompt) -> DomainResult<String> {
        match self.call_once(prompt).await {
            Err(err) if err.is_transient() => {
                warn!(oracle = self.oracle.name(), error = %err, "Review oracle failed, retrying once");
                self.call_once(prompt).await
            }
            other => other,
        }
    }

    async fn call_once(&self, prompt: &ReviewPrompt) -> DomainResult<String> {
        tokio::time::timeout(self.timeout, self.oracle.generate_review(prompt))
            .await
            .map_err(|_| DomainError::Timeout {
                operation: "review oracle".to_string(),
                after_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            })?
    }

    /// Turn raw oracle text into a valid review, repairing derived fields.
    fn interpret(raw: &str, request: &SynthesisRequest) -> Result<GameReview, SchemaViolation> {
        let body = extract_json(raw);
        let mut review: GameReview =
            serde_json::from_str(body).map_err(|e| SchemaViolation::Malformed(e.to_string()))?;

        review.id = Uuid::new_v4().to_string();
        review.created_at = Utc::now().to_rfc3339();
        if let SynthesisRequest::Transcript { messages, .. } = request {
            review.messages.clone_from(messages);
        }

        match validate(review.clone()) {
            Ok(valid) => Ok(valid),
            Err(violation) if violation.is_derivable() => {
                debug!(%violation, "Repairing derived review fields");
                rederive(&mut review);
                validate(review)
            }
            Err(violation) => Err(violation),
        }
    }
}

#[async_trait]
impl ReviewSynthesizer for OracleSynthesizer {
    fn name(&self) -> &'static str {
        "oracle"
    }

    #[instrument(skip(self, request), fields(mode = request.mode().as_str(), oracle = self.oracle.name()))]
    async fn synthesize(&self, request: SynthesisRequest) -> DomainResult<GameReview> {
        request.check_input()?;

        let prompt = review_prompts::for_request(&request);
        let raw = self.call_oracle(&prompt).await?;
        let violation = match Self::interpret(&raw, &request) {
            Ok(review) => return Ok(review),
            Err(violation) => violation,
        };

        warn!(%violation, "Oracle review rejected, asking for a correction");
        let prompt = prompt.with_correction(raw, review_prompts::correction(&violation));
        let raw = self.call_oracle(&prompt).await?;
        Self::interpret(&raw, &request).map_err(|violation| {
            DomainError::Synthesis(format!(
                "oracle output still invalid after correction: {violation}"
            ))
        })
    }
}

/// Pull the JSON object out of an answer that may be wrapped in a markdown
/// fence or surrounded by prose.
pub fn extract_json(raw: &str) -> &str {
    let trimmed = raw.trim();

    let unfenced = if trimmed.starts_with("```") && trimmed.ends_with("```") && trimmed.len() >= 6 {
        let start = trimmed.find('\n').map_or(3, |pos| pos + 1);
        let end = trimmed.rfind("\n```").unwrap_or(trimmed.len() - 3);
        if start <= end {
            trimmed[start..end].trim()
        } else {
            trimmed
        }
    } else {
        trimmed
    };

    match (unfenced.find('{'), unfenced.rfind('}')) {
        (Some(start), Some(end)) if start < end => &unfenced[start..=end],
        _ => unfenced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::oracles::mock::{MockResponse, MockReviewOracle};
    use crate::domain::models::{ImageFormat, Message, MoveLabel, ScreenshotRef, Speaker};
    use crate::services::fixture_synthesizer::demo_review;

    fn demo_json() -> String {
        serde_json::to_string(&demo_review().unwrap()).unwrap()
    }

    fn screenshot() -> SynthesisRequest {
        SynthesisRequest::screenshot(ScreenshotRef::from_bytes(ImageFormat::Png, b"\x89PNG"))
    }

    fn synthesizer(oracle: &Arc<MockReviewOracle>) -> OracleSynthesizer {
        OracleSynthesizer::new(oracle.clone(), Duration::from_millis(200))
    }

    #[test]
    fn test_extract_json_strips_fences_and_prose() {
        assert_eq!(extract_json("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(extract_json("Here you go: {\"a\":1} enjoy"), "{\"a\":1}");
        assert_eq!(extract_json("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(extract_json("no json"), "no json");
    }

    #[tokio::test]
    async fn test_valid_answer_is_accepted_and_restamped() {
        let oracle = Arc::new(MockReviewOracle::with_default_response(MockResponse::success(
            format!("```json\n{}\n```", demo_json()),
        )));
        let review = synthesizer(&oracle).synthesize(screenshot()).await.unwrap();
        assert_ne!(review.id, "demo-fixture");
        assert_eq!(review.message_reviews[0].label, MoveLabel::Blunder);
        assert_eq!(oracle.calls().await, 1);
    }

    #[tokio::test]
    async fn test_derived_fields_are_repaired_without_retry() {
        let mut broken = demo_review().unwrap();
        broken.label_counts.you.blunder = 9;
        broken.message_reviews[2].eval_after = 100.0;
        let oracle = Arc::new(MockReviewOracle::with_default_response(MockResponse::success(
            serde_json::to_string(&broken).unwrap(),
        )));

        let review = synthesizer(&oracle).synthesize(screenshot()).await.unwrap();
        assert_eq!(review.label_counts.you.blunder, 1);
        assert_eq!(review.final_eval(), 1.5);
        assert_eq!(oracle.calls().await, 1);
    }

    #[tokio::test]
    async fn test_invalid_answer_gets_one_correction() {
        let oracle = Arc::new(MockReviewOracle::new());
        oracle.push_response(MockResponse::success("not json at all")).await;
        oracle.push_response(MockResponse::success(demo_json())).await;

        let review = synthesizer(&oracle).synthesize(screenshot()).await;
        assert!(review.is_ok());
        assert_eq!(oracle.calls().await, 2);

        let prompts = oracle.prompts().await;
        assert_eq!(prompts[1].turns.len(), 3);
        assert!(prompts[1].turns[2].text.contains("invalid"));
    }

    #[tokio::test]
    async fn test_second_invalid_answer_is_synthesis_error() {
        let oracle = Arc::new(MockReviewOracle::with_default_response(MockResponse::success(
            "{\"id\": 1}",
        )));
        let err = synthesizer(&oracle).synthesize(screenshot()).await.unwrap_err();
        assert!(matches!(err, DomainError::Synthesis(_)));
        assert_eq!(oracle.calls().await, 2);
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried_once() {
        let oracle = Arc::new(MockReviewOracle::new());
        oracle.push_response(MockResponse::transient("overloaded")).await;

        assert!(synthesizer(&oracle).synthesize(screenshot()).await.is_ok());
        assert_eq!(oracle.calls().await, 2);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let oracle = Arc::new(MockReviewOracle::new());
        oracle.push_response(MockResponse::failure("invalid api key")).await;

        let err = synthesizer(&oracle).synthesize(screenshot()).await.unwrap_err();
        assert_eq!(err.kind().as_str(), "oracle_error");
        assert_eq!(oracle.calls().await, 1);
    }

    #[tokio::test]
    async fn test_hanging_oracle_times_out() {
        let oracle = Arc::new(MockReviewOracle::with_default_response(MockResponse::hang()));
        let err = synthesizer(&oracle).synthesize(screenshot()).await.unwrap_err();
        assert!(matches!(err, DomainError::Timeout { .. }));
        // The timeout counts as transient, so it was attempted twice.
        assert_eq!(oracle.calls().await, 2);
    }

    #[tokio::test]
    async fn test_transcript_messages_replace_oracle_messages() {
        let oracle = Arc::new(MockReviewOracle::with_default_response(MockResponse::success(
            demo_json(),
        )));
        let mut transcript = demo_review().unwrap().messages;
        transcript[1].text = "kk".to_string();

        let review = synthesizer(&oracle)
            .synthesize(SynthesisRequest::transcript(transcript.clone()))
            .await
            .unwrap();
        assert_eq!(review.messages, transcript);
        assert_eq!(review.suggested_replies[0].original, "kk");
    }

    #[tokio::test]
    async fn test_empty_transcript_never_reaches_oracle() {
        let oracle = Arc::new(MockReviewOracle::new());
        let err = synthesizer(&oracle)
            .synthesize(SynthesisRequest::transcript(Vec::<Message>::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Input(_)));
        assert_eq!(oracle.calls().await, 0);
    }

    #[tokio::test]
    async fn test_blank_transcript_message_never_reaches_oracle() {
        let oracle = Arc::new(MockReviewOracle::new());
        let transcript = vec![
            Message::from_them("m1", "Still on for tonight?"),
            Message::from_you("m2", "   "),
        ];

        let err = synthesizer(&oracle)
            .synthesize(SynthesisRequest::transcript(transcript))
            .await
            .unwrap_err();
        assert_eq!(err.kind().as_str(), "input_error");
        assert_eq!(oracle.calls().await, 0);
    }

    #[tokio::test]
    async fn test_duplicate_transcript_ids_never_reach_oracle() {
        let oracle = Arc::new(MockReviewOracle::new());
        let transcript = vec![Message::from_you("m1", "hey"), Message::from_them("m1", "hi")];

        let err = synthesizer(&oracle)
            .synthesize(SynthesisRequest::transcript(transcript))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Input(_)));
        assert_eq!(oracle.calls().await, 0);
    }

    #[tokio::test]
    async fn test_flag_mismatch_is_normalized() {
        let mut broken = demo_review().unwrap();
        let theirs = broken
            .messages
            .iter_mut()
            .find(|m| m.speaker == Speaker::Them)
            .unwrap();
        theirs.is_user = true;
        let oracle = Arc::new(MockReviewOracle::with_default_response(MockResponse::success(
            serde_json::to_string(&broken).unwrap(),
        )));
        let review = synthesizer(&oracle).synthesize(screenshot()).await.unwrap();
        assert!(review.messages.iter().all(|m| m.is_user == (m.speaker == Speaker::You)));
    }
}
