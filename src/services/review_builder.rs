//! Derivation of review fields from per-move judgments.
//!
//! A review has two kinds of content: judgments (label, delta, explanation and
//! suggestion for each move) and fields derived from them (move numbers,
//! running evaluation, chart series, tallies, suggested replies, critical
//! moments). `build` assembles a review from judgments; `rederive` recomputes
//! the derived fields of an existing review in place.

use std::collections::{HashMap, HashSet};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    CriticalMoment, EvalSample, GameReview, Message, MessageReview, MoveLabel, Players, Speaker,
    SuggestedReply, EVAL_BASELINE, MAX_CRITICAL_MOMENTS,
};
use crate::services::schema_validator::{expected_label_counts, move_positions};

/// Reason used when a suggested reply has none of its own.
const DEFAULT_REASON: &str = "Keeps the conversation warm and gives them something to answer.";

/// Judgment of a single move.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveJudgment {
    pub message_id: String,
    pub label: MoveLabel,
    pub eval_delta: f64,
    pub explanation: String,
    /// Better reply; required for error labels
    pub suggestion: Option<String>,
    pub reason: Option<String>,
    /// Headline if this move becomes a critical moment
    pub headline: Option<String>,
}

impl MoveJudgment {
    pub fn new(
        message_id: impl Into<String>,
        label: MoveLabel,
        eval_delta: f64,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            label,
            eval_delta,
            explanation: explanation.into(),
            suggestion: None,
            reason: None,
            headline: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>, reason: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self.reason = Some(reason.into());
        self
    }

    pub fn with_headline(mut self, headline: impl Into<String>) -> Self {
        self.headline = Some(headline.into());
        self
    }
}

/// Everything needed to build a review.
#[derive(Debug, Clone)]
pub struct ReviewDraft {
    pub id: String,
    pub created_at: String,
    pub messages: Vec<Message>,
    pub players: Players,
    /// Derived from the transcript when absent
    pub opening_name: Option<String>,
    pub overall_coach_summary: String,
    pub judgments: Vec<MoveJudgment>,
    pub suggested_next_move: Option<String>,
}

/// Assemble a review from a draft.
///
/// Every reviewable message needs exactly one judgment. Judgments may arrive in
/// any order; the review lists them by move number.
pub fn build(draft: ReviewDraft) -> DomainResult<GameReview> {
    if draft.messages.is_empty() {
        return Err(DomainError::Input("draft has no messages".to_string()));
    }

    let reviews = {
        let positions = move_positions(&draft.messages);
        let mut slots: Vec<Option<&MoveJudgment>> = vec![None; positions.len()];

        for judgment in &draft.judgments {
            let Some(&position) = positions.get(judgment.message_id.as_str()) else {
                return Err(DomainError::Input(format!(
                    "judgment for `{}` does not target a reviewable message",
                    judgment.message_id
                )));
            };
            let slot = &mut slots[(position - 1) as usize];
            if slot.is_some() {
                return Err(DomainError::Input(format!(
                    "message `{}` is judged more than once",
                    judgment.message_id
                )));
            }
            if judgment.label.is_error() && judgment.suggestion.is_none() {
                return Err(DomainError::Input(format!(
                    "`{}` is labeled {} but has no suggestion",
                    judgment.message_id, judgment.label
                )));
            }
            *slot = Some(judgment);
        }

        let mut running = EVAL_BASELINE;
        let mut reviews = Vec::with_capacity(slots.len());
        for (judgment, move_number) in slots.into_iter().zip(1u32..) {
            let Some(judgment) = judgment else {
                return Err(DomainError::Input(format!("move {move_number} has no judgment")));
            };
            running += judgment.eval_delta;
            reviews.push(MessageReview {
                message_id: judgment.message_id.clone(),
                move_number,
                label: judgment.label,
                eval_delta: judgment.eval_delta,
                eval_after: running,
                explanation: judgment.explanation.clone(),
                suggested_reply: judgment
                    .suggestion
                    .clone()
                    .filter(|_| judgment.label.is_error()),
            });
        }
        reviews
    };

    let judgments: HashMap<&str, &MoveJudgment> = draft
        .judgments
        .iter()
        .map(|j| (j.message_id.as_str(), j))
        .collect();

    let suggested_replies = suggested_replies(&draft.messages, &reviews, |id| {
        judgments.get(id).and_then(|j| j.reason.clone())
    });
    let critical_moments = select_critical_moments(&reviews)
        .into_iter()
        .map(|index| {
            let entry = &reviews[index];
            let headline = judgments
                .get(entry.message_id.as_str())
                .and_then(|j| j.headline.clone());
            critical_moment(entry, headline)
        })
        .collect();

    let opening_name = draft
        .opening_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| opening_name(&draft.messages).to_string());

    Ok(GameReview {
        id: draft.id,
        created_at: draft.created_at,
        eval_series: eval_series(&reviews),
        label_counts: expected_label_counts(&draft.messages, &reviews),
        messages: draft.messages,
        players: draft.players,
        opening_name,
        overall_coach_summary: draft.overall_coach_summary,
        message_reviews: reviews,
        critical_moments,
        suggested_replies,
        suggested_next_move: draft.suggested_next_move,
    })
}

/// Recompute every derived field of `review` from its own judgments.
///
/// Labels, deltas, explanations and suggestions are kept. Reviews pointing at
/// messages that are not moves are left for the validator to reject.
pub fn rederive(review: &mut GameReview) {
    for message in &mut review.messages {
        message.is_user = message.speaker == Speaker::You;
    }

    let positions = move_positions(&review.messages);
    review.message_reviews.sort_by_key(|entry| {
        positions
            .get(entry.message_id.as_str())
            .copied()
            .unwrap_or(u32::MAX)
    });

    let mut running = EVAL_BASELINE;
    for entry in &mut review.message_reviews {
        if let Some(&position) = positions.get(entry.message_id.as_str()) {
            entry.move_number = position;
        }
        running += entry.eval_delta;
        entry.eval_after = running;
    }

    review.eval_series = eval_series(&review.message_reviews);
    review.label_counts = expected_label_counts(&review.messages, &review.message_reviews);

    let reasons: HashMap<String, String> = review
        .suggested_replies
        .drain(..)
        .filter(|reply| !reply.reason.trim().is_empty())
        .map(|reply| (reply.message_id, reply.reason))
        .collect();
    review.suggested_replies = suggested_replies(&review.messages, &review.message_reviews, |id| {
        reasons.get(id).cloned()
    });

    review.critical_moments = rederive_critical_moments(review);
}

fn eval_series(reviews: &[MessageReview]) -> Vec<EvalSample> {
    std::iter::once(EvalSample::baseline())
        .chain(reviews.iter().map(|entry| EvalSample {
            move_number: entry.move_number,
            eval: entry.eval_after,
            label: Some(entry.label),
        }))
        .collect()
}

fn suggested_replies(
    messages: &[Message],
    reviews: &[MessageReview],
    reason_for: impl Fn(&str) -> Option<String>,
) -> Vec<SuggestedReply> {
    reviews
        .iter()
        .filter(|entry| entry.label.is_error())
        .filter_map(|entry| {
            let suggestion = entry.suggested_reply.clone()?;
            let original = messages.iter().find(|m| m.id == entry.message_id)?;
            Some(SuggestedReply {
                message_id: entry.message_id.clone(),
                move_number: entry.move_number,
                original: original.text.clone(),
                suggestion,
                reason: reason_for(&entry.message_id).unwrap_or_else(|| DEFAULT_REASON.to_string()),
            })
        })
        .collect()
}

fn critical_moment(entry: &MessageReview, headline: Option<String>) -> CriticalMoment {
    CriticalMoment {
        move_number: entry.move_number,
        message_id: entry.message_id.clone(),
        label: entry.label,
        headline: headline
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| entry.label.default_headline().to_string()),
        explanation: entry.explanation.clone(),
        better_line: entry.suggested_reply.clone().unwrap_or_default(),
    }
}

/// Indices of the moves worth highlighting, in move order.
///
/// Picks the best move (highest delta), the worst (lowest delta) and then the
/// largest remaining swing by magnitude, up to `MAX_CRITICAL_MOMENTS`. Ties go
/// to the earlier move. Zero-delta moves are never picked as the extra swing.
pub fn select_critical_moments(reviews: &[MessageReview]) -> Vec<usize> {
    let mut picked: Vec<usize> = Vec::with_capacity(MAX_CRITICAL_MOMENTS);
    let pick = |index: Option<usize>, picked: &mut Vec<usize>| {
        if let Some(index) = index {
            if !picked.contains(&index) && picked.len() < MAX_CRITICAL_MOMENTS {
                picked.push(index);
            }
        }
    };

    let best = reviews
        .iter()
        .enumerate()
        .fold(None::<(usize, f64)>, |acc, (i, entry)| match acc {
            Some((_, delta)) if delta >= entry.eval_delta => acc,
            _ => Some((i, entry.eval_delta)),
        })
        .map(|(i, _)| i);
    let worst = reviews
        .iter()
        .enumerate()
        .fold(None::<(usize, f64)>, |acc, (i, entry)| match acc {
            Some((_, delta)) if delta <= entry.eval_delta => acc,
            _ => Some((i, entry.eval_delta)),
        })
        .map(|(i, _)| i);
    pick(best, &mut picked);
    pick(worst, &mut picked);

    let swing = reviews
        .iter()
        .enumerate()
        .filter(|(i, entry)| !picked.contains(i) && entry.eval_delta != 0.0)
        .fold(None::<(usize, f64)>, |acc, (i, entry)| match acc {
            Some((_, magnitude)) if magnitude >= entry.eval_delta.abs() => acc,
            _ => Some((i, entry.eval_delta.abs())),
        })
        .map(|(i, _)| i);
    pick(swing, &mut picked);

    picked.sort_unstable();
    picked
}

/// Keep the review's own critical moments where they still line up with a
/// move, fixing their move number and label; select fresh ones if none do.
fn rederive_critical_moments(review: &GameReview) -> Vec<CriticalMoment> {
    let by_id: HashMap<&str, &MessageReview> = review
        .message_reviews
        .iter()
        .map(|entry| (entry.message_id.as_str(), entry))
        .collect();

    let mut seen = HashSet::new();
    let mut kept: Vec<CriticalMoment> = review
        .critical_moments
        .iter()
        .filter_map(|moment| {
            let entry = by_id.get(moment.message_id.as_str())?;
            if !seen.insert(moment.message_id.as_str()) {
                return None;
            }
            let mut fixed = critical_moment(entry, Some(moment.headline.clone()));
            if !moment.explanation.trim().is_empty() {
                fixed.explanation = moment.explanation.clone();
            }
            if !moment.better_line.is_empty() {
                fixed.better_line = moment.better_line.clone();
            }
            Some(fixed)
        })
        .collect();

    if kept.is_empty() {
        return select_critical_moments(&review.message_reviews)
            .into_iter()
            .map(|index| critical_moment(&review.message_reviews[index], None))
            .collect();
    }

    kept.sort_by_key(|moment| moment.move_number);
    kept.truncate(MAX_CRITICAL_MOMENTS);
    kept
}

/// Flavor name for how the conversation opened.
pub fn opening_name(messages: &[Message]) -> &'static str {
    let opponent_opened = messages
        .first()
        .is_some_and(|m| m.speaker != Speaker::You);

    if let Some(first_move) = messages.iter().find(|m| m.is_reviewable()) {
        let text = first_move.text.trim();
        if text.chars().count() <= 2 || !text.contains(char::is_whitespace) {
            return "Dry Texter Defense";
        }
        if text.ends_with('?') {
            return "Inquisitive Gambit";
        }
        if text.contains('!') {
            return "Enthusiast's Attack";
        }
    }

    if opponent_opened {
        "Reply Opening"
    } else {
        "Casual Opening"
    }
}
