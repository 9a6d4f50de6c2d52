//! Reverse-coding transform from a raw Likert answer to a trait score.

use crate::core::loose::{ANSWER_MAX, ANSWER_MIN, LooseValue};

/// Score substituted for answers that cannot be read.
pub const NEUTRAL_SCORE: u8 = 3;

/// Map a raw answer to its trait score.
///
/// Reverse-coded items score `6 - raw`. Answers outside `[1, 5]` fail closed
/// to [`NEUTRAL_SCORE`] so one bad record cannot abort a session's scoring.
#[must_use]
pub fn transform(raw_answer: i64, reverse: bool) -> u8 {
    let Some(value) = u8::try_from(raw_answer)
        .ok()
        .filter(|value| (ANSWER_MIN..=ANSWER_MAX).contains(value))
    else {
        return NEUTRAL_SCORE;
    };
    if reverse {
        ANSWER_MAX + ANSWER_MIN - value
    } else {
        value
    }
}

/// Transform straight from spreadsheet cells.
#[must_use]
pub fn transform_loose(raw_answer: &LooseValue, reverse: &LooseValue) -> u8 {
    transform(i64::from(normalize_answer(raw_answer)), reverse.is_truthy())
}

/// Read a raw answer cell, substituting the neutral midpoint when unreadable.
#[must_use]
pub fn normalize_answer(raw_answer: &LooseValue) -> u8 {
    raw_answer.as_answer().unwrap_or(NEUTRAL_SCORE)
}
