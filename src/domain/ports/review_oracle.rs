//! Review oracle port - interface for the external reasoning service.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Message, ScreenshotRef};

/// Who authored a prompt turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptRole {
    User,
    Assistant,
}

/// One turn of the conversation sent to the oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTurn {
    pub role: PromptRole,
    pub text: String,
    /// Image shown alongside the text (user turns only)
    pub image: Option<ScreenshotRef>,
}

impl PromptTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: PromptRole::User,
            text: text.into(),
            image: None,
        }
    }

    pub fn user_with_image(text: impl Into<String>, image: ScreenshotRef) -> Self {
        Self {
            role: PromptRole::User,
            text: text.into(),
            image: Some(image),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: PromptRole::Assistant,
            text: text.into(),
            image: None,
        }
    }
}

/// Everything the oracle sees for one review request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewPrompt {
    pub system: String,
    pub turns: Vec<PromptTurn>,
    /// Messages under review when they are known up front (empty for screenshots)
    pub transcript: Vec<Message>,
}

impl ReviewPrompt {
    pub fn new(system: impl Into<String>, first_turn: PromptTurn) -> Self {
        Self {
            system: system.into(),
            turns: vec![first_turn],
            transcript: Vec::new(),
        }
    }

    pub fn with_transcript(mut self, messages: &[Message]) -> Self {
        self.transcript = messages.to_vec();
        self
    }

    /// Append the rejected answer and a correction request.
    pub fn with_correction(mut self, rejected: impl Into<String>, correction: impl Into<String>) -> Self {
        self.turns.push(PromptTurn::assistant(rejected));
        self.turns.push(PromptTurn::user(correction));
        self
    }
}

/// Trait for the external reasoning oracle.
///
/// Output is raw text that should contain a JSON game review. Callers treat it
/// as untrusted and validate it before use.
#[async_trait]
pub trait ReviewOracle: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &'static str;

    /// Ask the oracle for a review and return its raw answer.
    async fn generate_review(&self, prompt: &ReviewPrompt) -> DomainResult<String>;
}
