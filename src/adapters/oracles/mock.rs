//! Mock oracles for offline use and testing.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{GameReview, Message, MoveLabel, Player, Players};
use crate::domain::ports::{PersonaOracle, PersonaTurn, ReviewOracle, ReviewPrompt};
use crate::services::fixture_synthesizer::demo_review;
use crate::services::review_builder::{build, MoveJudgment, ReviewDraft};

/// Mock response configuration.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Answer with this text
    Text(String),
    /// Fail with an oracle error
    Fail { message: String, transient: bool },
    /// Never answer
    Hang,
}

impl MockResponse {
    pub fn success(output: impl Into<String>) -> Self {
        Self::Text(output.into())
    }

    /// Failure that will not go away on retry.
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Fail {
            message: error.into(),
            transient: false,
        }
    }

    pub fn transient(error: impl Into<String>) -> Self {
        Self::Fail {
            message: error.into(),
            transient: true,
        }
    }

    pub fn hang() -> Self {
        Self::Hang
    }

    async fn play(self) -> DomainResult<String> {
        match self {
            Self::Text(text) => Ok(text),
            Self::Fail { message, transient } => Err(DomainError::Oracle { message, transient }),
            Self::Hang => std::future::pending().await,
        }
    }
}

/// Queue of scripted responses in front of a default.
#[derive(Debug)]
struct Script {
    default_response: MockResponse,
    queued: Mutex<VecDeque<MockResponse>>,
}

impl Script {
    fn new(default_response: MockResponse) -> Self {
        Self {
            default_response,
            queued: Mutex::new(VecDeque::new()),
        }
    }

    async fn next_queued(&self) -> Option<MockResponse> {
        self.queued.lock().await.pop_front()
    }
}

/// Review oracle for offline use.
///
/// Scripted responses play first. Unscripted calls review the prompt's
/// transcript when it has one and fall back to the default response
/// otherwise.
#[derive(Debug)]
pub struct MockReviewOracle {
    script: Script,
    review_transcripts: bool,
    prompts: Arc<Mutex<Vec<ReviewPrompt>>>,
}

impl MockReviewOracle {
    /// Reviews transcripts it is given; screenshots get the demo review.
    pub fn new() -> Self {
        let demo = demo_review()
            .ok()
            .and_then(|review| serde_json::to_string(&review).ok())
            .unwrap_or_default();
        Self {
            review_transcripts: true,
            ..Self::with_default_response(MockResponse::success(demo))
        }
    }

    /// Answers every unscripted call with `response`.
    pub fn with_default_response(response: MockResponse) -> Self {
        Self {
            script: Script::new(response),
            review_transcripts: false,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a response for the next call.
    pub async fn push_response(&self, response: MockResponse) {
        self.script.queued.lock().await.push_back(response);
    }

    /// Prompts received so far.
    pub async fn prompts(&self) -> Vec<ReviewPrompt> {
        self.prompts.lock().await.clone()
    }

    pub async fn calls(&self) -> usize {
        self.prompts.lock().await.len()
    }
}

impl Default for MockReviewOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReviewOracle for MockReviewOracle {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn generate_review(&self, prompt: &ReviewPrompt) -> DomainResult<String> {
        self.prompts.lock().await.push(prompt.clone());
        if let Some(scripted) = self.script.next_queued().await {
            return scripted.play().await;
        }
        if self.review_transcripts && !prompt.transcript.is_empty() {
            let review = transcript_review(&prompt.transcript)?;
            return Ok(serde_json::to_string(&review)?);
        }
        self.script.default_response.clone().play().await
    }
}

/// Review of a known transcript, judging each user message by simple cues.
fn transcript_review(messages: &[Message]) -> DomainResult<GameReview> {
    let judgments = messages
        .iter()
        .filter(|m| m.is_reviewable())
        .map(judge)
        .collect();
    build(ReviewDraft {
        id: "mock-review".to_string(),
        created_at: Utc::now().to_rfc3339(),
        messages: messages.to_vec(),
        players: Players {
            you: Player::new("You", 75.0),
            them: Player::new("Them", 80.0),
        },
        opening_name: None,
        overall_coach_summary: "Offline review: short replies cost you, energy helps.".to_string(),
        judgments,
        suggested_next_move: None,
    })
}

fn judge(message: &Message) -> MoveJudgment {
    let text = message.text.trim();
    if text.chars().count() <= 2 {
        MoveJudgment::new(&message.id, MoveLabel::Blunder, -1.0, "Too short to keep things going.")
            .with_suggestion(format!("{text}! What did you have in mind?"), "Gives them something to answer.")
            .with_headline("The conversation stalls")
    } else if text.ends_with('!') {
        MoveJudgment::new(&message.id, MoveLabel::GreatMove, 0.5, "Brings real energy.")
    } else {
        MoveJudgment::new(&message.id, MoveLabel::GoodMove, 0.25, "Keeps the exchange moving.")
    }
}

/// Persona oracle that echoes the user's message.
#[derive(Debug)]
pub struct MockPersonaOracle {
    queued: Mutex<VecDeque<MockResponse>>,
    calls: Mutex<usize>,
}

impl MockPersonaOracle {
    pub fn new() -> Self {
        Self {
            queued: Mutex::new(VecDeque::new()),
            calls: Mutex::new(0),
        }
    }

    /// Queue a response for the next call; unscripted calls echo.
    pub async fn push_response(&self, response: MockResponse) {
        self.queued.lock().await.push_back(response);
    }

    pub async fn calls(&self) -> usize {
        *self.calls.lock().await
    }

    /// The echo reply used when nothing is scripted.
    pub fn echo(persona_id: &str, user_message: &str) -> String {
        format!("[Mock {persona_id}]: Re: \"{user_message}\"")
    }
}

impl Default for MockPersonaOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PersonaOracle for MockPersonaOracle {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn respond(&self, turn: PersonaTurn<'_>) -> DomainResult<String> {
        *self.calls.lock().await += 1;
        let scripted = self.queued.lock().await.pop_front();
        match scripted {
            Some(response) => response.play().await,
            None => Ok(Self::echo(turn.persona.id, turn.user_message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::PersonaTable;
    use crate::domain::ports::PromptTurn;

    #[tokio::test]
    async fn test_review_oracle_defaults_to_demo_review() {
        let oracle = MockReviewOracle::new();
        let prompt = ReviewPrompt::new("system", PromptTurn::user("go"));
        let raw = oracle.generate_review(&prompt).await.unwrap();
        assert!(raw.contains("demo-fixture"));
        assert_eq!(oracle.calls().await, 1);
    }

    #[tokio::test]
    async fn test_review_oracle_plays_script_in_order() {
        let oracle = MockReviewOracle::new();
        oracle.push_response(MockResponse::failure("nope")).await;
        oracle.push_response(MockResponse::success("second")).await;
        let prompt = ReviewPrompt::new("system", PromptTurn::user("go"));

        assert!(oracle.generate_review(&prompt).await.is_err());
        assert_eq!(oracle.generate_review(&prompt).await.unwrap(), "second");
        assert!(oracle.generate_review(&prompt).await.unwrap().contains("demo-fixture"));
    }

    #[tokio::test]
    async fn test_review_oracle_reviews_the_prompt_transcript() {
        let oracle = MockReviewOracle::new();
        let transcript = vec![
            Message::from_you("you-1", "hey, free friday?"),
            Message::from_them("them-1", "maybe"),
            Message::from_you("you-2", "k"),
            Message::from_them("them-2", "lol ok"),
        ];
        let prompt = ReviewPrompt::new("system", PromptTurn::user("go")).with_transcript(&transcript);

        let raw = oracle.generate_review(&prompt).await.unwrap();
        let review: GameReview = serde_json::from_str(&raw).unwrap();

        assert_eq!(review.messages, transcript);
        let labels: Vec<MoveLabel> = review.message_reviews.iter().map(|r| r.label).collect();
        assert_eq!(labels, [MoveLabel::GoodMove, MoveLabel::Blunder]);
        assert_eq!(review.suggested_replies[0].message_id, "you-2");
    }

    #[tokio::test]
    async fn test_fixed_default_ignores_transcript() {
        let oracle = MockReviewOracle::with_default_response(MockResponse::success("fixed"));
        let prompt = ReviewPrompt::new("system", PromptTurn::user("go"))
            .with_transcript(&[Message::from_you("you-1", "hi")]);
        assert_eq!(oracle.generate_review(&prompt).await.unwrap(), "fixed");
    }

    #[tokio::test]
    async fn test_persona_oracle_echoes() {
        let oracle = MockPersonaOracle::new();
        let persona = PersonaTable.get("dry").unwrap();
        let reply = oracle
            .respond(PersonaTurn {
                persona,
                turn: 1,
                transcript: &[],
                user_message: "hey",
            })
            .await
            .unwrap();
        assert_eq!(reply, "[Mock dry]: Re: \"hey\"");
        assert_eq!(oracle.calls().await, 1);
    }
}
