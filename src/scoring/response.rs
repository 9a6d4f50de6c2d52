//! Answered items: typed responses, tabular ingestion, latency classification.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bank::item::{ControlKind, ItemDefinition, MetaSubtype};
use crate::core::errors::{InventoryError, Result};
use crate::core::loose::{LooseValue, flag_or_false};
use crate::scoring::transform::{NEUTRAL_SCORE, normalize_answer, transform};

/// One answered item.
///
/// The coded answer is read-only: [`ItemResponse::score`] always equals
/// `transform(raw_answer, reverse)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemResponse {
    /// Id of the answered item.
    pub item_id: String,
    /// Category the score aggregates into.
    pub category: String,
    /// Role of the answered item.
    pub control_kind: ControlKind,
    /// Meta subtype answered, for meta rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_subtype: Option<MetaSubtype>,
    /// Item wording, quoted as contradiction evidence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    raw_answer: u8,
    reverse: bool,
    /// Seconds spent answering; never negative or non-finite.
    pub latency_seconds: f64,
    score: u8,
}

impl ItemResponse {
    /// Build a response, normalizing an out-of-range answer to the neutral
    /// midpoint and an unusable latency to zero.
    #[must_use]
    pub fn new(
        item_id: impl Into<String>,
        category: impl Into<String>,
        control_kind: ControlKind,
        raw_answer: i64,
        reverse: bool,
        latency_seconds: f64,
    ) -> Self {
        let item_id = item_id.into();
        let raw_answer = u8::try_from(raw_answer)
            .ok()
            .filter(|value| (1..=5).contains(value))
            .unwrap_or_else(|| {
                tracing::warn!(item = %item_id, raw_answer, "answer outside [1,5]; using neutral score");
                NEUTRAL_SCORE
            });
        Self {
            category: category.into(),
            control_kind,
            meta_subtype: None,
            text: None,
            raw_answer,
            reverse,
            latency_seconds: sanitize_latency(&item_id, latency_seconds),
            score: transform(i64::from(raw_answer), reverse),
            item_id,
        }
    }

    /// Answer a bank item.
    #[must_use]
    pub fn answer(item: &ItemDefinition, raw_answer: i64, latency_seconds: f64) -> Self {
        Self {
            meta_subtype: item.meta_subtype,
            text: Some(item.text.clone()),
            ..Self::new(
                item.id.clone(),
                item.category.clone(),
                item.control_kind,
                raw_answer,
                item.reverse,
                latency_seconds,
            )
        }
    }

    /// Answer on the 1-5 scale as given, after neutral recovery.
    #[must_use]
    pub const fn raw_answer(&self) -> u8 {
        self.raw_answer
    }

    /// Whether the item was reverse-coded.
    #[must_use]
    pub const fn reverse(&self) -> bool {
        self.reverse
    }

    /// Reverse-adjusted score.
    #[must_use]
    pub const fn score(&self) -> u8 {
        self.score
    }

    /// Attach the meta subtype this response answers.
    #[must_use]
    pub fn with_meta_subtype(mut self, subtype: MetaSubtype) -> Self {
        self.meta_subtype = Some(subtype);
        self
    }

    /// Attach the item wording.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Normalize one exported row. Never fails: malformed cells are recovered
    /// locally and logged.
    ///
    /// A row in a reserved meta category (`polygraph`, `regret`,
    /// `honesty_meta`) is a meta response even when its control-kind cell is
    /// blank or says `none`.
    #[must_use]
    pub fn from_record(record: RawResponseRecord) -> Self {
        let item_id = record.item_id.to_string();
        let raw_kind = record.control_kind.as_deref().unwrap_or_default();
        let parsed_kind = ControlKind::parse(raw_kind).unwrap_or_else(|| {
            tracing::warn!(item = %item_id, kind = raw_kind, "unknown control kind; treating as regular");
            ControlKind::None
        });
        let category_subtype = MetaSubtype::from_category(&record.category);
        let control_kind = match (parsed_kind, category_subtype) {
            (ControlKind::None, Some(_)) => ControlKind::Meta,
            (kind, _) => kind,
        };
        let meta_subtype = (control_kind == ControlKind::Meta)
            .then(|| {
                record
                    .meta_subtype
                    .as_deref()
                    .and_then(MetaSubtype::parse)
                    .or(category_subtype)
                    .or_else(|| MetaSubtype::parse(&record.category))
            })
            .flatten();

        if record.raw_answer.as_answer().is_none() {
            tracing::warn!(item = %item_id, raw = %record.raw_answer, "unreadable answer; using neutral score");
        }
        let raw_answer = normalize_answer(&record.raw_answer);
        let latency = match record.latency_seconds.as_ref() {
            Some(cell) => cell.as_f64().unwrap_or(f64::NAN),
            None => 0.0,
        };

        Self {
            meta_subtype,
            text: record.text.filter(|text| !text.trim().is_empty()),
            ..Self::new(
                item_id,
                record.category.trim(),
                control_kind,
                i64::from(raw_answer),
                flag_or_false(record.reverse.as_ref()),
                latency,
            )
        }
    }

    /// Classify this response's latency against the given bounds.
    #[must_use]
    pub fn latency_status(&self, fast_secs: f64, slow_secs: f64) -> LatencyStatus {
        LatencyStatus::classify(self.latency_seconds, fast_secs, slow_secs)
    }
}

/// Response row as exported by the administering session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResponseRecord {
    /// Item id; numeric ids are stringified.
    #[serde(alias = "id")]
    pub item_id: LooseValue,
    /// Category tag.
    #[serde(alias = "trait")]
    pub category: String,
    /// Control kind cell; unknown values degrade to a regular item.
    #[serde(default, alias = "control_type")]
    pub control_kind: Option<String>,
    /// Explicit meta subtype.
    #[serde(default)]
    pub meta_subtype: Option<String>,
    /// Item wording.
    #[serde(default, alias = "question")]
    pub text: Option<String>,
    /// Answer cell in any loose form.
    #[serde(alias = "original_answer", alias = "answer")]
    pub raw_answer: LooseValue,
    /// Loose reverse flag.
    #[serde(default)]
    pub reverse: Option<LooseValue>,
    /// Latency in seconds; missing means 0.
    #[serde(default, alias = "time_taken")]
    pub latency_seconds: Option<LooseValue>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResponseDocument {
    Table { responses: Vec<RawResponseRecord> },
    Rows(Vec<RawResponseRecord>),
}

/// Normalize a batch of exported rows, preserving order.
#[must_use]
pub fn ingest(records: Vec<RawResponseRecord>) -> Vec<ItemResponse> {
    records.into_iter().map(ItemResponse::from_record).collect()
}

/// Load a response export from `.json` (array or `{ "responses": [...] }`)
/// or `.toml` (`[[responses]]`).
pub fn load_responses(path: &Path) -> Result<Vec<ItemResponse>> {
    let raw = fs::read_to_string(path).map_err(|source| InventoryError::io(path, source))?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let document: ResponseDocument = match extension.as_deref() {
        Some("json") => serde_json::from_str(&raw)?,
        Some("toml") => toml::from_str(&raw)?,
        _ => {
            return Err(InventoryError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }
    };
    let records = match document {
        ResponseDocument::Table { responses } | ResponseDocument::Rows(responses) => responses,
    };
    Ok(ingest(records))
}

/// Answer-speed classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatencyStatus {
    /// Below the fast threshold.
    TooFast,
    /// Within bounds.
    Normal,
    /// Above the slow threshold.
    TooSlow,
}

impl LatencyStatus {
    /// Strictly below `fast_secs` is too fast; strictly above `slow_secs` is too slow.
    #[must_use]
    pub fn classify(latency_seconds: f64, fast_secs: f64, slow_secs: f64) -> Self {
        if latency_seconds < fast_secs {
            Self::TooFast
        } else if latency_seconds > slow_secs {
            Self::TooSlow
        } else {
            Self::Normal
        }
    }
}

fn sanitize_latency(item_id: &str, latency_seconds: f64) -> f64 {
    if latency_seconds.is_finite() && latency_seconds >= 0.0 {
        latency_seconds
    } else {
        tracing::warn!(item = %item_id, latency_seconds, "unusable latency; recording 0");
        0.0
    }
}
