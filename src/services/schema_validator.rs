//! Game review validation.
//!
//! `validate` checks every cross-field invariant of a `GameReview` and either
//! hands the review back or names the first rule it broke. The checks run in a
//! fixed order so that referential problems are reported before the derived
//! fields that depend on them.

use std::collections::{HashMap, HashSet};

use chrono::DateTime;

use crate::domain::errors::SchemaViolation;
use crate::domain::models::{
    check_transcript, EvalSample, GameReview, LabelCounts, LabelTally, Message, MessageReview,
    PlayerSide, EVAL_BASELINE, MAX_CRITICAL_MOMENTS,
};

/// Allowed drift between `evalAfter` and the recomputed running total.
pub const EVAL_TOLERANCE: f64 = 1e-6;

type Check = Result<(), SchemaViolation>;

/// Validate a candidate review.
pub fn validate(review: GameReview) -> Result<GameReview, SchemaViolation> {
    check_required_strings(&review)?;
    check_transcript(&review.messages)?;
    check_players(&review)?;

    let positions = move_positions(&review.messages);
    check_review_references(&review, &positions)?;
    check_move_numbers(&review, &positions)?;
    check_suggested_reply_presence(&review.message_reviews)?;
    check_eval_recurrence(&review.message_reviews)?;
    check_eval_series(&review.eval_series, &review.message_reviews)?;
    check_label_counts(&review)?;
    check_suggested_replies(&review)?;
    check_critical_moments(&review)?;

    Ok(review)
}

/// 1-based move number of every reviewable message, keyed by message id.
pub(crate) fn move_positions(messages: &[Message]) -> HashMap<&str, u32> {
    messages
        .iter()
        .filter(|m| m.is_reviewable())
        .zip(1u32..)
        .map(|(m, n)| (m.id.as_str(), n))
        .collect()
}

fn check_required_strings(review: &GameReview) -> Check {
    let required = [
        ("id", review.id.as_str()),
        ("openingName", review.opening_name.as_str()),
        ("overallCoachSummary", review.overall_coach_summary.as_str()),
        ("players.you.name", review.players.you.name.as_str()),
        ("players.them.name", review.players.them.name.as_str()),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(SchemaViolation::empty(field));
        }
    }

    if DateTime::parse_from_rfc3339(&review.created_at).is_err() {
        return Err(SchemaViolation::InvalidTimestamp(review.created_at.clone()));
    }
    Ok(())
}

fn check_players(review: &GameReview) -> Check {
    for side in PlayerSide::ALL {
        let accuracy = review.players.for_side(side).accuracy;
        if !accuracy.is_finite() {
            return Err(SchemaViolation::NonFiniteNumber {
                field: format!("players.{}.accuracy", side.as_str()),
            });
        }
        if !(0.0..=100.0).contains(&accuracy) {
            return Err(SchemaViolation::AccuracyOutOfRange {
                side: SchemaViolation::side(side),
                value: accuracy,
            });
        }
    }
    Ok(())
}

fn check_review_references(review: &GameReview, positions: &HashMap<&str, u32>) -> Check {
    let mut reviewed = HashSet::new();
    for entry in &review.message_reviews {
        if review.message(&entry.message_id).is_none() {
            return Err(SchemaViolation::UnknownMessageId {
                field: "messageReviews".to_string(),
                message_id: entry.message_id.clone(),
            });
        }
        if !positions.contains_key(entry.message_id.as_str()) {
            return Err(SchemaViolation::NotReviewable {
                message_id: entry.message_id.clone(),
            });
        }
        if !reviewed.insert(entry.message_id.as_str()) {
            return Err(SchemaViolation::DuplicateReview {
                message_id: entry.message_id.clone(),
            });
        }
        if entry.explanation.trim().is_empty() {
            return Err(SchemaViolation::empty(format!(
                "messageReviews[{}].explanation",
                entry.message_id
            )));
        }
        for (field, value) in [("evalDelta", entry.eval_delta), ("evalAfter", entry.eval_after)] {
            if !value.is_finite() {
                return Err(SchemaViolation::NonFiniteNumber {
                    field: format!("messageReviews[{}].{field}", entry.message_id),
                });
            }
        }
    }

    if reviewed.len() != positions.len() {
        return Err(SchemaViolation::MissingReviews {
            expected: positions.len(),
            actual: reviewed.len(),
        });
    }
    Ok(())
}

fn check_move_numbers(review: &GameReview, positions: &HashMap<&str, u32>) -> Check {
    for (index, entry) in review.message_reviews.iter().enumerate() {
        let expected = positions
            .get(entry.message_id.as_str())
            .copied()
            .unwrap_or_default();
        if entry.move_number != expected {
            return Err(SchemaViolation::MoveNumberMismatch {
                field: "messageReviews".to_string(),
                message_id: entry.message_id.clone(),
                expected,
                actual: entry.move_number,
            });
        }
        // Ascending order: with every move reviewed once, position i holds move i + 1.
        let slot = u32::try_from(index + 1).unwrap_or(u32::MAX);
        if entry.move_number != slot {
            return Err(SchemaViolation::MoveNumberMismatch {
                field: "messageReviews order".to_string(),
                message_id: entry.message_id.clone(),
                expected: slot,
                actual: entry.move_number,
            });
        }
    }
    Ok(())
}

fn check_suggested_reply_presence(reviews: &[MessageReview]) -> Check {
    for entry in reviews {
        let present = entry
            .suggested_reply
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty());
        if present != entry.label.is_error() {
            return Err(SchemaViolation::SuggestedReplyPresence {
                move_number: entry.move_number,
                label: entry.label,
            });
        }
    }
    Ok(())
}

fn check_eval_recurrence(reviews: &[MessageReview]) -> Check {
    let mut previous = EVAL_BASELINE;
    for entry in reviews {
        let expected = previous + entry.eval_delta;
        if (entry.eval_after - expected).abs() > EVAL_TOLERANCE {
            return Err(SchemaViolation::EvalRecurrence {
                move_number: entry.move_number,
                expected,
                actual: entry.eval_after,
            });
        }
        previous = entry.eval_after;
    }
    Ok(())
}

fn check_eval_series(series: &[EvalSample], reviews: &[MessageReview]) -> Check {
    if series.len() != reviews.len() + 1 {
        return Err(SchemaViolation::EvalSeriesLength {
            expected: reviews.len() + 1,
            actual: series.len(),
        });
    }

    let baseline = EvalSample::baseline();
    let first = &series[0];
    if first.move_number != baseline.move_number
        || (first.eval - baseline.eval).abs() > EVAL_TOLERANCE
        || first.label.is_some()
    {
        return Err(SchemaViolation::EvalSeriesMismatch {
            index: 0,
            reason: "baseline must be move 0 at eval 0 with no label".to_string(),
        });
    }

    for (offset, (sample, entry)) in series[1..].iter().zip(reviews).enumerate() {
        let index = offset + 1;
        let reason = if sample.move_number != entry.move_number {
            Some(format!(
                "moveNumber {} but review has {}",
                sample.move_number, entry.move_number
            ))
        } else if !sample.eval.is_finite() || (sample.eval - entry.eval_after).abs() > EVAL_TOLERANCE {
            Some(format!("eval {} but evalAfter is {}", sample.eval, entry.eval_after))
        } else if sample.label != Some(entry.label) {
            Some(format!("label does not match `{}`", entry.label))
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(SchemaViolation::EvalSeriesMismatch { index, reason });
        }
    }
    Ok(())
}

/// Label tallies implied by the reviews, split by the speaker of each move.
pub(crate) fn expected_label_counts(
    messages: &[Message],
    reviews: &[MessageReview],
) -> LabelCounts {
    let mut counts = LabelCounts::default();
    for entry in reviews {
        let side = messages
            .iter()
            .find(|m| m.id == entry.message_id)
            .and_then(|m| m.speaker.player());
        if let Some(side) = side {
            counts.for_side_mut(side).increment(entry.label);
        }
    }
    counts
}

fn check_label_counts(review: &GameReview) -> Check {
    let expected = expected_label_counts(&review.messages, &review.message_reviews);
    for side in PlayerSide::ALL {
        let want: &LabelTally = expected.for_side(side);
        let got = review.label_counts.for_side(side);
        for (label, count) in want.iter() {
            let actual = got.get(label);
            if actual != count {
                return Err(SchemaViolation::LabelCountMismatch {
                    side: SchemaViolation::side(side),
                    label,
                    expected: count,
                    actual,
                });
            }
        }
    }
    Ok(())
}

fn check_suggested_replies(review: &GameReview) -> Check {
    for reply in &review.suggested_replies {
        if review.message(&reply.message_id).is_none() {
            return Err(SchemaViolation::UnknownMessageId {
                field: "suggestedReplies".to_string(),
                message_id: reply.message_id.clone(),
            });
        }
    }

    let weak: Vec<&MessageReview> = review
        .message_reviews
        .iter()
        .filter(|entry| entry.label.is_error())
        .collect();
    if weak.len() != review.suggested_replies.len() {
        return Err(SchemaViolation::SuggestedRepliesMismatch(format!(
            "{} weak moves but {} suggested replies",
            weak.len(),
            review.suggested_replies.len()
        )));
    }

    for (entry, reply) in weak.iter().zip(&review.suggested_replies) {
        let original = review
            .message(&entry.message_id)
            .map(|m| m.text.as_str())
            .unwrap_or_default();
        let problem = if reply.message_id != entry.message_id {
            Some(format!(
                "expected reply for `{}`, found `{}`",
                entry.message_id, reply.message_id
            ))
        } else if reply.move_number != entry.move_number {
            Some(format!(
                "`{}` has moveNumber {} instead of {}",
                reply.message_id, reply.move_number, entry.move_number
            ))
        } else if reply.original != original {
            Some(format!("`{}` does not quote the original text", reply.message_id))
        } else if entry.suggested_reply.as_deref() != Some(reply.suggestion.as_str()) {
            Some(format!(
                "`{}` suggestion differs from the review's suggestedReply",
                reply.message_id
            ))
        } else if reply.reason.trim().is_empty() {
            Some(format!("`{}` has an empty reason", reply.message_id))
        } else {
            None
        };
        if let Some(problem) = problem {
            return Err(SchemaViolation::SuggestedRepliesMismatch(problem));
        }
    }
    Ok(())
}

fn check_critical_moments(review: &GameReview) -> Check {
    let count = review.critical_moments.len();
    if count > MAX_CRITICAL_MOMENTS {
        return Err(SchemaViolation::TooManyCriticalMoments {
            count,
            max: MAX_CRITICAL_MOMENTS,
        });
    }

    let mut seen = HashSet::new();
    for moment in &review.critical_moments {
        if review.message(&moment.message_id).is_none() {
            return Err(SchemaViolation::UnknownMessageId {
                field: "criticalMoments".to_string(),
                message_id: moment.message_id.clone(),
            });
        }
        let mismatch = |reason: &str| SchemaViolation::CriticalMomentMismatch {
            message_id: moment.message_id.clone(),
            reason: reason.to_string(),
        };
        let Some(entry) = review
            .message_reviews
            .iter()
            .find(|entry| entry.message_id == moment.message_id)
        else {
            return Err(mismatch("message has no review"));
        };
        if !seen.insert(moment.message_id.as_str()) {
            return Err(mismatch("listed more than once"));
        }
        if moment.move_number != entry.move_number {
            return Err(mismatch("moveNumber differs"));
        }
        if moment.label != entry.label {
            return Err(mismatch("label differs"));
        }
        if moment.headline.trim().is_empty() {
            return Err(SchemaViolation::empty("criticalMoments[].headline"));
        }
        if moment.explanation.trim().is_empty() {
            return Err(SchemaViolation::empty("criticalMoments[].explanation"));
        }
    }
    Ok(())
}
