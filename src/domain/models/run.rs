//! Practice run state.
//!
//! A run alternates user and persona messages until `TURN_LIMIT` turns have
//! been played. The transcript only ever grows, and only by whole turns: a
//! user message and its reply are committed together.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};

use super::message::Message;
use super::review::GameReview;

/// Number of turns in a practice run.
pub const TURN_LIMIT: u32 = 5;

/// Opaque run token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RunId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Externally visible run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    /// Started, no turns played yet
    NotStarted,
    /// `turns_played` turns are in the transcript
    InProgress { turns_played: u32 },
    /// All turns played
    Completed,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress { .. } => "in_progress",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A practice conversation against one persona.
#[derive(Debug, Clone)]
pub struct Run {
    pub id: RunId,
    pub persona_id: String,
    pub turns_played: u32,
    pub transcript: Vec<Message>,
    /// Review produced on completion; `None` until synthesis succeeds
    pub review: Option<GameReview>,
    /// Persona replies that fell back to the placeholder in a row
    pub consecutive_persona_failures: u32,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

impl Run {
    pub fn new(persona_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: RunId::generate(),
            persona_id: persona_id.into(),
            turns_played: 0,
            transcript: Vec::new(),
            review: None,
            consecutive_persona_failures: 0,
            created_at: now,
            last_active_at: now,
        }
    }

    pub fn state(&self) -> RunState {
        match self.turns_played {
            0 => RunState::NotStarted,
            n if n >= TURN_LIMIT => RunState::Completed,
            n => RunState::InProgress { turns_played: n },
        }
    }

    pub fn is_completed(&self) -> bool {
        self.turns_played >= TURN_LIMIT
    }

    /// 1-based number of the turn about to be played.
    pub fn next_turn(&self) -> u32 {
        self.turns_played + 1
    }

    /// Build the user's message for the next turn.
    pub fn user_message(&self, text: &str) -> Message {
        Message::from_you(format!("you-{}", self.next_turn()), text)
    }

    /// Build the persona's reply for the next turn.
    pub fn persona_message(&self, text: &str) -> Message {
        Message::from_them(format!("them-{}", self.next_turn()), text)
    }

    /// Reject a submission that the current state does not allow.
    pub fn ensure_accepts_turn(&self) -> DomainResult<()> {
        if self.is_completed() {
            return Err(DomainError::InvalidTransition {
                from: self.state().to_string(),
                reason: format!("run {} already played all {TURN_LIMIT} turns", self.id),
            });
        }
        Ok(())
    }

    /// Append a complete turn.
    pub fn commit_turn(&mut self, user: Message, reply: Message) -> DomainResult<()> {
        self.ensure_accepts_turn()?;
        self.transcript.push(user);
        self.transcript.push(reply);
        self.turns_played += 1;
        self.touch();
        Ok(())
    }

    pub fn touch(&mut self) {
        self.last_active_at = Utc::now();
    }

    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            run_id: self.id.clone(),
            persona_id: self.persona_id.clone(),
            state: self.state(),
            turns_played: self.turns_played,
            transcript: self.transcript.clone(),
            review: self.review.clone(),
        }
    }
}

/// Read-only view of a run handed to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSnapshot {
    pub run_id: RunId,
    pub persona_id: String,
    pub state: RunState,
    pub turns_played: u32,
    pub transcript: Vec<Message>,
    pub review: Option<GameReview>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play_turn(run: &mut Run, text: &str) -> DomainResult<()> {
        let user = run.user_message(text);
        let reply = run.persona_message("ok");
        run.commit_turn(user, reply)
    }

    #[test]
    fn test_new_run_is_not_started() {
        let run = Run::new("dry");
        assert_eq!(run.state(), RunState::NotStarted);
        assert!(run.transcript.is_empty());
        assert_eq!(run.next_turn(), 1);
    }

    #[test]
    fn test_turns_advance_state() {
        let mut run = Run::new("dry");
        play_turn(&mut run, "hi").unwrap();
        assert_eq!(run.state(), RunState::InProgress { turns_played: 1 });
        assert_eq!(run.transcript.len(), 2);
        assert_eq!(run.transcript[0].id, "you-1");
        assert_eq!(run.transcript[1].id, "them-1");

        for _ in 1..TURN_LIMIT {
            play_turn(&mut run, "more").unwrap();
        }
        assert_eq!(run.state(), RunState::Completed);
        assert_eq!(run.transcript.len(), 10);
    }

    #[test]
    fn test_completed_run_rejects_turns() {
        let mut run = Run::new("dry");
        for _ in 0..TURN_LIMIT {
            play_turn(&mut run, "x").unwrap();
        }
        let err = play_turn(&mut run, "one more").unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
        assert_eq!(run.transcript.len(), 10);
    }

    #[test]
    fn test_run_ids_are_unique() {
        assert_ne!(RunId::generate(), RunId::generate());
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_value(RunState::InProgress { turns_played: 2 }).unwrap();
        assert_eq!(json["state"], "in_progress");
        assert_eq!(json["turns_played"], 2);
    }
}
