//! Loosely-typed tabular cell values and their one-time normalization.
//!
//! Item banks and response exports arrive from spreadsheets, so a reverse flag
//! may be `true`, `"TRUE"`, `1` or `"yes"`, and an answer may be `4`, `4.0` or
//! `"4"`. Everything is normalized here, once, at ingestion.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Tokens accepted as a true flag (compared trimmed and case-insensitively).
pub const TRUTHY_TOKENS: [&str; 5] = ["true", "t", "yes", "y", "1"];

/// Lowest valid Likert answer.
pub const ANSWER_MIN: u8 = 1;
/// Highest valid Likert answer.
pub const ANSWER_MAX: u8 = 5;

/// One spreadsheet-style cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LooseValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl LooseValue {
    /// Normalize to a flag. Anything outside [`TRUTHY_TOKENS`] is false.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(value) => *value,
            Self::Int(value) => *value == 1,
            Self::Float(_) => false,
            Self::Text(text) => is_truthy_token(text),
        }
    }

    /// Interpret as an integer, accepting integral floats and integer strings.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Bool(_) => None,
            Self::Int(value) => Some(*value),
            #[allow(clippy::cast_possible_truncation)]
            Self::Float(value) => {
                (value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15)
                    .then(|| *value as i64)
            }
            Self::Text(text) => text.trim().parse::<i64>().ok(),
        }
    }

    /// Interpret as a Likert answer in `[1, 5]`.
    #[must_use]
    pub fn as_answer(&self) -> Option<u8> {
        self.as_integer()
            .and_then(|value| u8::try_from(value).ok())
            .filter(|value| (ANSWER_MIN..=ANSWER_MAX).contains(value))
    }

    /// Interpret as a finite float.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Self::Bool(_) => return None,
            #[allow(clippy::cast_precision_loss)]
            Self::Int(value) => *value as f64,
            Self::Float(value) => *value,
            Self::Text(text) => text.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl fmt::Display for LooseValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<bool> for LooseValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for LooseValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for LooseValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Whether a text token is one of the documented truthy tokens.
#[must_use]
pub fn is_truthy_token(raw: &str) -> bool {
    let token = raw.trim();
    TRUTHY_TOKENS
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(token))
}

/// Normalize an optional flag cell; a missing cell is false.
#[must_use]
pub fn flag_or_false(value: Option<&LooseValue>) -> bool {
    value.is_some_and(LooseValue::is_truthy)
}
