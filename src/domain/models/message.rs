//! Conversation messages.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::errors::SchemaViolation;

/// Who sent a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// The person asking for the review
    You,
    /// The other side of the conversation
    Them,
    /// Sender could not be determined from the screenshot
    Unknown,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::You => "you",
            Self::Them => "them",
            Self::Unknown => "unknown",
        }
    }

    /// The side of the board this speaker plays, if any.
    pub fn player(&self) -> Option<PlayerSide> {
        match self {
            Self::You => Some(PlayerSide::You),
            Self::Them => Some(PlayerSide::Them),
            Self::Unknown => None,
        }
    }
}

/// One of the two players in a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerSide {
    You,
    Them,
}

impl PlayerSide {
    pub const ALL: [Self; 2] = [Self::You, Self::Them];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::You => "you",
            Self::Them => "them",
        }
    }
}

/// A single chat message.
///
/// `is_user` duplicates `speaker == You` for consumers that only look at the
/// flag. The two must agree; the validator rejects reviews where they don't.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub speaker: Speaker,
    pub text: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    pub is_user: bool,
}

impl Message {
    pub fn new(id: impl Into<String>, speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            speaker,
            text: text.into(),
            timestamp: None,
            is_user: speaker == Speaker::You,
        }
    }

    pub fn from_you(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, Speaker::You, text)
    }

    pub fn from_them(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(id, Speaker::Them, text)
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Whether this message is a move that gets reviewed.
    ///
    /// Only the user's own messages are moves. The same rule applies to
    /// screenshot reviews and practice runs.
    pub fn is_reviewable(&self) -> bool {
        self.speaker == Speaker::You
    }
}

/// Check a message list on its own: non-empty, unique non-blank ids,
/// non-blank text and `is_user` agreeing with the speaker.
pub fn check_transcript(messages: &[Message]) -> Result<(), SchemaViolation> {
    if messages.is_empty() {
        return Err(SchemaViolation::NoMessages);
    }

    let mut seen = HashSet::new();
    for message in messages {
        if message.id.trim().is_empty() {
            return Err(SchemaViolation::empty("messages[].id"));
        }
        if !seen.insert(message.id.as_str()) {
            return Err(SchemaViolation::DuplicateMessageId(message.id.clone()));
        }
        if message.text.trim().is_empty() {
            return Err(SchemaViolation::empty(format!(
                "messages[{}].text",
                message.id
            )));
        }
        if message.is_user != message.is_reviewable() {
            return Err(SchemaViolation::SpeakerFlagMismatch {
                message_id: message.id.clone(),
                speaker: message.speaker.as_str().to_string(),
                is_user: message.is_user,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructor_keeps_flag_consistent() {
        assert!(Message::from_you("m1", "hi").is_user);
        assert!(!Message::from_them("m2", "hey").is_user);
        assert!(!Message::new("m3", Speaker::Unknown, "?").is_user);
    }

    #[test]
    fn test_serializes_camel_case() {
        let msg = Message::from_you("m1", "k");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["isUser"], true);
        assert_eq!(json["speaker"], "you");
        assert!(json["timestamp"].is_null());
    }

    #[test]
    fn test_deserializes_missing_timestamp() {
        let msg: Message =
            serde_json::from_str(r#"{"id":"a","speaker":"them","text":"yo","isUser":false}"#)
                .unwrap();
        assert_eq!(msg.timestamp, None);
        assert_eq!(msg.speaker, Speaker::Them);
    }

    #[test]
    fn test_only_user_messages_are_reviewable() {
        assert!(Message::from_you("a", "x").is_reviewable());
        assert!(!Message::from_them("b", "y").is_reviewable());
        assert!(!Message::new("c", Speaker::Unknown, "z").is_reviewable());
    }
}
