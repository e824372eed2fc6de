//! Domain errors for the review system.

use serde::Serialize;
use thiserror::Error;

use super::models::{MoveLabel, PlayerSide};

/// A broken review invariant.
///
/// One variant per rule, so callers can decide between repairing derived
/// fields and asking the oracle again.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaViolation {
    #[error("response is not a well-formed game review: {0}")]
    Malformed(String),

    #[error("required field `{field}` is empty")]
    EmptyField { field: String },

    #[error("review has no messages")]
    NoMessages,

    #[error("message id `{0}` appears more than once")]
    DuplicateMessageId(String),

    #[error("message `{message_id}` has isUser={is_user} but speaker `{speaker}`")]
    SpeakerFlagMismatch {
        message_id: String,
        speaker: String,
        is_user: bool,
    },

    #[error("createdAt `{0}` is not an RFC 3339 timestamp")]
    InvalidTimestamp(String),

    #[error("`{field}` is not a finite number")]
    NonFiniteNumber { field: String },

    #[error("accuracy for {side} is {value}, expected 0-100")]
    AccuracyOutOfRange { side: String, value: f64 },

    #[error("{field} references unknown message `{message_id}`")]
    UnknownMessageId { field: String, message_id: String },

    #[error("message `{message_id}` is not a reviewable move")]
    NotReviewable { message_id: String },

    #[error("message `{message_id}` is reviewed more than once")]
    DuplicateReview { message_id: String },

    #[error("{field} for `{message_id}` has moveNumber {actual}, expected {expected}")]
    MoveNumberMismatch {
        field: String,
        message_id: String,
        expected: u32,
        actual: u32,
    },

    #[error("reviews cover {actual} moves but the transcript has {expected}")]
    MissingReviews { expected: usize, actual: usize },

    #[error("evalAfter at move {move_number} is {actual}, expected {expected}")]
    EvalRecurrence {
        move_number: u32,
        expected: f64,
        actual: f64,
    },

    #[error("evalSeries has {actual} samples, expected {expected}")]
    EvalSeriesLength { expected: usize, actual: usize },

    #[error("evalSeries sample {index} does not match its move: {reason}")]
    EvalSeriesMismatch { index: usize, reason: String },

    #[error("labelCounts.{side}[{label}] is {actual}, expected {expected}")]
    LabelCountMismatch {
        side: String,
        label: MoveLabel,
        expected: u32,
        actual: u32,
    },

    #[error("move {move_number} is labeled {label} but suggestedReply presence is wrong")]
    SuggestedReplyPresence { move_number: u32, label: MoveLabel },

    #[error("suggestedReplies do not match the weak moves: {0}")]
    SuggestedRepliesMismatch(String),

    #[error("{count} critical moments exceed the maximum of {max}")]
    TooManyCriticalMoments { count: usize, max: usize },

    #[error("critical moment for `{message_id}` disagrees with its review: {reason}")]
    CriticalMomentMismatch { message_id: String, reason: String },
}

impl SchemaViolation {
    /// Whether the repair pass can fix this by recomputing derived fields.
    ///
    /// Derived fields are everything computable from the transcript plus the
    /// per-move label, delta, explanation and suggestion.
    pub fn is_derivable(&self) -> bool {
        matches!(
            self,
            Self::SpeakerFlagMismatch { .. }
                | Self::MoveNumberMismatch { .. }
                | Self::EvalRecurrence { .. }
                | Self::EvalSeriesLength { .. }
                | Self::EvalSeriesMismatch { .. }
                | Self::LabelCountMismatch { .. }
                | Self::SuggestedRepliesMismatch(_)
                | Self::TooManyCriticalMoments { .. }
                | Self::CriticalMomentMismatch { .. }
        )
    }

    pub(crate) fn empty(field: impl Into<String>) -> Self {
        Self::EmptyField {
            field: field.into(),
        }
    }

    pub(crate) fn side(side: PlayerSide) -> String {
        side.as_str().to_string()
    }
}

/// Stable error category exposed across the crate boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InputError,
    OracleError,
    Timeout,
    SchemaViolation,
    SynthesisError,
    InvalidTransition,
    NotFound,
    CacheError,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InputError => "input_error",
            Self::OracleError => "oracle_error",
            Self::Timeout => "timeout",
            Self::SchemaViolation => "schema_violation",
            Self::SynthesisError => "synthesis_error",
            Self::InvalidTransition => "invalid_transition",
            Self::NotFound => "not_found",
            Self::CacheError => "cache_error",
            Self::Internal => "internal",
        }
    }
}

/// Domain-level errors that can occur in the review system.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Oracle call failed: {message}")]
    Oracle { message: String, transient: bool },

    #[error("{operation} timed out after {after_ms}ms")]
    Timeout { operation: String, after_ms: u64 },

    #[error("Schema violation: {0}")]
    SchemaViolation(#[from] SchemaViolation),

    #[error("Review synthesis failed: {0}")]
    Synthesis(String),

    #[error("Invalid state transition from {from}: {reason}")]
    InvalidTransition { from: String, reason: String },

    #[error("Run not found: {0}")]
    RunNotFound(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Input(_) => ErrorKind::InputError,
            Self::Oracle { .. } => ErrorKind::OracleError,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::SchemaViolation(_) => ErrorKind::SchemaViolation,
            Self::Synthesis(_) => ErrorKind::SynthesisError,
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::RunNotFound(_) => ErrorKind::NotFound,
            Self::Cache(_) => ErrorKind::CacheError,
            Self::Serialization(_) | Self::Configuration(_) => ErrorKind::Internal,
        }
    }

    /// Oracle failure worth one more attempt.
    pub fn oracle_transient(message: impl Into<String>) -> Self {
        Self::Oracle {
            message: message.into(),
            transient: true,
        }
    }

    /// Oracle failure that will not go away on retry.
    pub fn oracle_permanent(message: impl Into<String>) -> Self {
        Self::Oracle {
            message: message.into(),
            transient: false,
        }
    }

    /// Whether retrying the same call could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Oracle { transient, .. } => *transient,
            Self::Timeout { .. } => true,
            _ => false,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport::from(self)
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        Self::Cache(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// What callers see of an error: a stable tag and a message, no source chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&DomainError> for ErrorReport {
    fn from(err: &DomainError) -> Self {
        let message = match err {
            // Internal details stay internal.
            DomainError::Serialization(_) | DomainError::Configuration(_) => {
                "internal error".to_string()
            }
            other => other.to_string(),
        };
        Self {
            kind: err.kind(),
            message,
        }
    }
}
