//! Prompts sent to the review oracle.

use std::fmt::Write as _;

use crate::domain::errors::SchemaViolation;
use crate::domain::models::{Message, Persona, ScreenshotRef};
use crate::domain::ports::{PromptTurn, ReviewPrompt, SynthesisRequest};

const COACH_ROLE: &str = "You are a meme-literate \"Game Review\" coach for text messages. \
You analyze conversations the way a chess engine analyzes games: each message the user sends \
is a move, and you judge it. Keep the tone PG-13, funny but analytical.";

/// Shape and rules of the answer, shared by both review modes.
const SCHEMA_RULES: &str = r#"Answer with a single JSON object and nothing else. Shape:
{
  "id": string,
  "createdAt": RFC 3339 timestamp,
  "messages": [{"id": string, "speaker": "you" | "them" | "unknown", "text": string, "timestamp": string | null, "isUser": boolean}],
  "players": {"you": {"name": string, "accuracy": number}, "them": {"name": string, "accuracy": number}},
  "openingName": string,
  "overallCoachSummary": string,
  "evalSeries": [{"moveNumber": number, "eval": number, "label": label | null}],
  "messageReviews": [{"messageId": string, "moveNumber": number, "label": label, "evalDelta": number, "evalAfter": number, "explanation": string, "suggestedReply": string | null}],
  "criticalMoments": [{"moveNumber": number, "messageId": string, "label": label, "headline": string, "explanation": string, "betterLine": string}],
  "labelCounts": {"you": {label: count, ...}, "them": {label: count, ...}},
  "suggestedReplies": [{"messageId": string, "moveNumber": number, "original": string, "suggestion": string, "reason": string}],
  "suggestedNextMove": string | null
}
A label is one of: "book move", "good move", "great move", "excellent move", "best move", "brilliant move", "inaccuracy", "mistake", "blunder".

Rules:
- Review every message whose speaker is "you", and only those. moveNumber counts those messages from 1 in order.
- isUser is true exactly when speaker is "you".
- evalAfter starts from 0 and adds evalDelta at every move. evalSeries starts with {"moveNumber": 0, "eval": 0, "label": null} and then has one entry per review with its evalAfter and label.
- labelCounts lists all nine labels for both players. "you" counts the labels of your reviews; "them" is all zeros.
- suggestedReply is set for inaccuracy, mistake and blunder, and null otherwise. suggestedReplies has one entry per such move, quoting the original text.
- Pick at most 3 critical moments: the best move, the worst move and optionally one more big swing. betterLine may be empty for excellent moves.
- accuracy is between 0 and 100 for each player.
- Give the opening a funny name, e.g. "Dry Texter Defense" or "Inquisitive Gambit"."#;

/// Build the first prompt for a request.
pub fn for_request(request: &SynthesisRequest) -> ReviewPrompt {
    match request {
        SynthesisRequest::Screenshot(image) => screenshot_prompt(image),
        SynthesisRequest::Transcript { messages, persona } => {
            transcript_prompt(messages, persona.as_ref())
        }
    }
}

/// Prompt for a screenshot: the oracle extracts the messages itself.
pub fn screenshot_prompt(image: &ScreenshotRef) -> ReviewPrompt {
    let system = format!(
        "{COACH_ROLE}\n\nYou will see a screenshot of a text conversation. Extract its messages \
         into \"messages\" in reading order. The user (\"you\") is usually the sender on the right, \
         in blue, green or gray bubbles. Use \"unknown\" when a message cannot be attributed.\n\n\
         {SCHEMA_RULES}"
    );
    ReviewPrompt::new(
        system,
        PromptTurn::user_with_image("Analyze this conversation.", image.clone()),
    )
}

/// Prompt for a known transcript, usually a finished practice run.
pub fn transcript_prompt(messages: &[Message], persona: Option<&Persona>) -> ReviewPrompt {
    let mut system = format!(
        "{COACH_ROLE}\n\nReview this completed practice conversation. Identify mistakes, \
         blunders and brilliant moves. Copy the messages exactly as given, keeping their ids.\n"
    );
    if let Some(persona) = persona {
        let _ = write!(
            system,
            "\nThe other side was played by {} ({}). Judge the user's moves against that vibe.\n",
            persona.name, persona.vibe
        );
    }
    system.push('\n');
    system.push_str(SCHEMA_RULES);

    let mut history = String::from("History:\n");
    for message in messages {
        let _ = writeln!(
            history,
            "[{}] {}: {}",
            message.id,
            message.speaker.as_str(),
            message.text
        );
    }
    ReviewPrompt::new(system, PromptTurn::user(history)).with_transcript(messages)
}

/// Follow-up asking the oracle to fix a rejected answer.
pub fn correction(violation: &SchemaViolation) -> String {
    format!(
        "That review is invalid: {violation}. Return the complete corrected JSON object, \
         following every rule above, with no other text."
    )
}
