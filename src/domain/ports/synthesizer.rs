//! Review synthesizer port.

use async_trait::async_trait;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    check_transcript, Fingerprint, GameReview, Message, Persona, ReviewMode, ScreenshotRef,
};

/// Input to a review.
#[derive(Debug, Clone)]
pub enum SynthesisRequest {
    /// Screenshot whose messages the oracle extracts itself
    Screenshot(ScreenshotRef),
    /// Known transcript from a practice run
    Transcript {
        messages: Vec<Message>,
        persona: Option<Persona>,
    },
}

impl SynthesisRequest {
    pub fn screenshot(image: ScreenshotRef) -> Self {
        Self::Screenshot(image)
    }

    pub fn transcript(messages: Vec<Message>) -> Self {
        Self::Transcript {
            messages,
            persona: None,
        }
    }

    pub fn practice_run(messages: Vec<Message>, persona: Persona) -> Self {
        Self::Transcript {
            messages,
            persona: Some(persona),
        }
    }

    pub fn mode(&self) -> ReviewMode {
        match self {
            Self::Screenshot(_) => ReviewMode::ScreenshotReview,
            Self::Transcript { .. } => ReviewMode::PuzzleReview,
        }
    }

    /// Reject input that cannot be reviewed before any oracle sees it.
    ///
    /// Transcripts go through the same message rules as a finished review,
    /// so a blank or inconsistent message is an input error rather than a
    /// synthesis failure.
    pub fn check_input(&self) -> DomainResult<()> {
        match self {
            Self::Screenshot(image) if image.byte_len == 0 => {
                Err(DomainError::Input("screenshot is empty".to_string()))
            }
            Self::Screenshot(_) => Ok(()),
            Self::Transcript { messages, .. } if messages.is_empty() => {
                Err(DomainError::Input("transcript is empty".to_string()))
            }
            Self::Transcript { messages, .. } => check_transcript(messages)
                .map_err(|violation| DomainError::Input(format!("malformed transcript: {violation}"))),
        }
    }

    /// Cache key for this input.
    ///
    /// Screenshots key on the raw image bytes. Transcripts key on the mode,
    /// the persona and the canonical JSON of the messages.
    pub fn fingerprint(&self) -> Fingerprint {
        match self {
            Self::Screenshot(image) => image.fingerprint.clone(),
            Self::Transcript { messages, persona } => {
                let body = serde_json::to_vec(messages).unwrap_or_default();
                let persona_id = persona.as_ref().map(|p| p.id).unwrap_or_default();
                Fingerprint::of_parts([
                    self.mode().as_str().as_bytes(),
                    persona_id.as_bytes(),
                    body.as_slice(),
                ])
            }
        }
    }
}

/// Trait for review synthesis strategies.
///
/// Every implementation returns reviews that pass the schema validator.
#[async_trait]
pub trait ReviewSynthesizer: Send + Sync {
    /// Strategy name, for logs.
    fn name(&self) -> &'static str;

    async fn synthesize(&self, request: SynthesisRequest) -> DomainResult<GameReview>;
}
