//! Persona oracle port - produces the simulated partner's replies.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Message, Persona};

/// Input for one persona reply.
#[derive(Debug, Clone, Copy)]
pub struct PersonaTurn<'a> {
    pub persona: &'a Persona,
    /// 1-based turn being played
    pub turn: u32,
    /// Transcript before the new user message
    pub transcript: &'a [Message],
    pub user_message: &'a str,
}

/// Trait for persona reply backends.
#[async_trait]
pub trait PersonaOracle: Send + Sync {
    fn name(&self) -> &'static str;

    /// Produce the persona's reply text.
    async fn respond(&self, turn: PersonaTurn<'_>) -> DomainResult<String>;
}
