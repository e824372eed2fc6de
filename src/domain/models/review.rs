//! Game review schema.
//!
//! These types mirror the JSON contract handed to presentation layers, so the
//! serde field names are camelCase and move labels serialize as their display
//! text ("brilliant move", "blunder", ...). Structural validity (labels from
//! the closed set, required fields present) is enforced by deserialization;
//! cross-field invariants are enforced by `services::schema_validator`.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::message::{Message, PlayerSide};

/// Evaluation before the first move.
pub const EVAL_BASELINE: f64 = 0.0;

/// Maximum number of critical moments in a review.
pub const MAX_CRITICAL_MOMENTS: usize = 3;

/// Classification of a single move.
///
/// Two independent scales: the good scale runs from `BookMove` up to
/// `BrilliantMove`, the error scale from `Inaccuracy` up to `Blunder`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MoveLabel {
    #[serde(rename = "book move")]
    BookMove,
    #[serde(rename = "good move")]
    GoodMove,
    #[serde(rename = "great move")]
    GreatMove,
    #[serde(rename = "excellent move")]
    ExcellentMove,
    #[serde(rename = "best move")]
    BestMove,
    #[serde(rename = "brilliant move")]
    BrilliantMove,
    #[serde(rename = "inaccuracy")]
    Inaccuracy,
    #[serde(rename = "mistake")]
    Mistake,
    #[serde(rename = "blunder")]
    Blunder,
}

impl MoveLabel {
    pub const ALL: [Self; 9] = [
        Self::BookMove,
        Self::GoodMove,
        Self::GreatMove,
        Self::ExcellentMove,
        Self::BestMove,
        Self::BrilliantMove,
        Self::Inaccuracy,
        Self::Mistake,
        Self::Blunder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BookMove => "book move",
            Self::GoodMove => "good move",
            Self::GreatMove => "great move",
            Self::ExcellentMove => "excellent move",
            Self::BestMove => "best move",
            Self::BrilliantMove => "brilliant move",
            Self::Inaccuracy => "inaccuracy",
            Self::Mistake => "mistake",
            Self::Blunder => "blunder",
        }
    }

    /// Parse the display form used on the wire.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|label| label.as_str() == s)
    }

    /// Labels that call for a suggested reply.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Inaccuracy | Self::Mistake | Self::Blunder)
    }

    /// Position on this label's own scale, starting at 0.
    pub fn severity(&self) -> u8 {
        match self {
            Self::BookMove | Self::Inaccuracy => 0,
            Self::GoodMove | Self::Mistake => 1,
            Self::GreatMove | Self::Blunder => 2,
            Self::ExcellentMove => 3,
            Self::BestMove => 4,
            Self::BrilliantMove => 5,
        }
    }

    /// Headline used when a critical moment has none of its own.
    pub fn default_headline(&self) -> &'static str {
        match self {
            Self::BookMove => "Straight From the Book",
            Self::GoodMove => "Solid Play",
            Self::GreatMove => "A Great Find",
            Self::ExcellentMove => "Excellent Technique",
            Self::BestMove => "The Engine Approves",
            Self::BrilliantMove => "Brilliant!",
            Self::Inaccuracy => "Slightly Off",
            Self::Mistake => "A Costly Mistake",
            Self::Blunder => "The Blunder",
        }
    }
}

impl fmt::Display for MoveLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Critique of one move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageReview {
    pub message_id: String,
    /// 1-based position among reviewable messages
    pub move_number: u32,
    pub label: MoveLabel,
    pub eval_delta: f64,
    /// Running evaluation after this move
    pub eval_after: f64,
    pub explanation: String,
    pub suggested_reply: Option<String>,
}

/// One point on the evaluation chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvalSample {
    pub move_number: u32,
    pub eval: f64,
    pub label: Option<MoveLabel>,
}

impl EvalSample {
    pub fn baseline() -> Self {
        Self {
            move_number: 0,
            eval: EVAL_BASELINE,
            label: None,
        }
    }
}

/// A move singled out as decision-relevant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalMoment {
    pub move_number: u32,
    pub message_id: String,
    pub label: MoveLabel,
    pub headline: String,
    pub explanation: String,
    /// Stronger alternative; empty when the move was already excellent
    #[serde(default)]
    pub better_line: String,
}

/// Count of each label for one player.
///
/// Every label is a required key on the wire, so a tally missing a label is
/// rejected at parse time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelTally {
    #[serde(rename = "book move")]
    pub book_move: u32,
    #[serde(rename = "good move")]
    pub good_move: u32,
    #[serde(rename = "great move")]
    pub great_move: u32,
    #[serde(rename = "excellent move")]
    pub excellent_move: u32,
    #[serde(rename = "best move")]
    pub best_move: u32,
    #[serde(rename = "brilliant move")]
    pub brilliant_move: u32,
    pub inaccuracy: u32,
    pub mistake: u32,
    pub blunder: u32,
}

impl LabelTally {
    pub fn get(&self, label: MoveLabel) -> u32 {
        match label {
            MoveLabel::BookMove => self.book_move,
            MoveLabel::GoodMove => self.good_move,
            MoveLabel::GreatMove => self.great_move,
            MoveLabel::ExcellentMove => self.excellent_move,
            MoveLabel::BestMove => self.best_move,
            MoveLabel::BrilliantMove => self.brilliant_move,
            MoveLabel::Inaccuracy => self.inaccuracy,
            MoveLabel::Mistake => self.mistake,
            MoveLabel::Blunder => self.blunder,
        }
    }

    fn slot_mut(&mut self, label: MoveLabel) -> &mut u32 {
        match label {
            MoveLabel::BookMove => &mut self.book_move,
            MoveLabel::GoodMove => &mut self.good_move,
            MoveLabel::GreatMove => &mut self.great_move,
            MoveLabel::ExcellentMove => &mut self.excellent_move,
            MoveLabel::BestMove => &mut self.best_move,
            MoveLabel::BrilliantMove => &mut self.brilliant_move,
            MoveLabel::Inaccuracy => &mut self.inaccuracy,
            MoveLabel::Mistake => &mut self.mistake,
            MoveLabel::Blunder => &mut self.blunder,
        }
    }

    pub fn increment(&mut self, label: MoveLabel) {
        *self.slot_mut(label) += 1;
    }

    pub fn total(&self) -> u32 {
        MoveLabel::ALL.iter().map(|label| self.get(*label)).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MoveLabel, u32)> + '_ {
        MoveLabel::ALL.into_iter().map(move |label| (label, self.get(label)))
    }
}

/// Label tallies for both players.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCounts {
    pub you: LabelTally,
    pub them: LabelTally,
}

impl LabelCounts {
    pub fn for_side(&self, side: PlayerSide) -> &LabelTally {
        match side {
            PlayerSide::You => &self.you,
            PlayerSide::Them => &self.them,
        }
    }

    pub fn for_side_mut(&mut self, side: PlayerSide) -> &mut LabelTally {
        match side {
            PlayerSide::You => &mut self.you,
            PlayerSide::Them => &mut self.them,
        }
    }
}

/// A better reply for one of the user's weak moves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedReply {
    pub message_id: String,
    pub move_number: u32,
    pub original: String,
    pub suggestion: String,
    pub reason: String,
}

/// Display name and accuracy for one side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    /// 0-100
    pub accuracy: f64,
}

impl Player {
    pub fn new(name: impl Into<String>, accuracy: f64) -> Self {
        Self {
            name: name.into(),
            accuracy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Players {
    pub you: Player,
    pub them: Player,
}

impl Players {
    pub fn for_side(&self, side: PlayerSide) -> &Player {
        match side {
            PlayerSide::You => &self.you,
            PlayerSide::Them => &self.them,
        }
    }
}

/// The complete review of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameReview {
    pub id: String,
    /// RFC 3339 timestamp
    pub created_at: String,
    pub messages: Vec<Message>,
    pub players: Players,
    pub opening_name: String,
    pub overall_coach_summary: String,
    pub eval_series: Vec<EvalSample>,
    pub message_reviews: Vec<MessageReview>,
    pub critical_moments: Vec<CriticalMoment>,
    pub label_counts: LabelCounts,
    pub suggested_replies: Vec<SuggestedReply>,
    pub suggested_next_move: Option<String>,
}

impl GameReview {
    pub fn message(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Number of moves that were reviewed.
    pub fn move_count(&self) -> usize {
        self.message_reviews.len()
    }

    /// Evaluation after the last move, or the baseline for an empty game.
    pub fn final_eval(&self) -> f64 {
        self.message_reviews
            .last()
            .map_or(EVAL_BASELINE, |review| review.eval_after)
    }
}

/// Which pipeline produced the input to a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewMode {
    /// Uploaded screenshot; the oracle extracts the messages itself
    ScreenshotReview,
    /// Completed practice run with a known transcript
    PuzzleReview,
}

impl ReviewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ScreenshotReview => "screenshot_review",
            Self::PuzzleReview => "puzzle_review",
        }
    }
}
