//! Item definitions: category tags, control kinds, meta subtypes, reverse coding.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::errors::{InventoryError, Result};
use crate::core::loose::{LooseValue, flag_or_false};

/// Role an item plays in the form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    /// Substantive trait/category item.
    #[default]
    None,
    /// One rewording of the central probe question.
    MainControl,
    /// Item probing the respondent's own honesty or willingness.
    Meta,
}

impl ControlKind {
    /// Canonical snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::MainControl => "main_control",
            Self::Meta => "meta",
        }
    }

    /// Parse a tabular control-kind cell. Blank cells mean `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match normalize_token(raw).as_str() {
            "" | "none" | "regular" => Some(Self::None),
            "main_control" | "control" => Some(Self::MainControl),
            "meta" => Some(Self::Meta),
            _ => None,
        }
    }
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of meta-item probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetaSubtype {
    /// Willingness to have answers verified (e.g. by polygraph).
    #[serde(alias = "polygraph")]
    WillingnessToVerify,
    /// Regret about answers already given.
    Regret,
    /// Self-reported honesty while answering.
    #[serde(alias = "honesty_meta")]
    SelfReportedHonesty,
}

impl MetaSubtype {
    /// Fixed round-robin order used for meta injection.
    pub const ALL: [Self; 3] = [
        Self::WillingnessToVerify,
        Self::Regret,
        Self::SelfReportedHonesty,
    ];

    /// Canonical snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WillingnessToVerify => "willingness_to_verify",
            Self::Regret => "regret",
            Self::SelfReportedHonesty => "self_reported_honesty",
        }
    }

    /// Parse a subtype cell, accepting the legacy aliases.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match normalize_token(raw).as_str() {
            "willingness_to_verify" | "polygraph" => Some(Self::WillingnessToVerify),
            "regret" => Some(Self::Regret),
            "self_reported_honesty" | "honesty_meta" | "honesty" => {
                Some(Self::SelfReportedHonesty)
            }
            _ => None,
        }
    }

    /// Recognize a category that is reserved for meta items.
    ///
    /// Narrower than [`MetaSubtype::parse`]: a bare `honesty` is an ordinary
    /// trait name and never marks a meta row.
    #[must_use]
    pub fn from_category(category: &str) -> Option<Self> {
        match normalize_token(category).as_str() {
            "willingness_to_verify" | "polygraph" => Some(Self::WillingnessToVerify),
            "regret" => Some(Self::Regret),
            "self_reported_honesty" | "honesty_meta" => Some(Self::SelfReportedHonesty),
            _ => None,
        }
    }
}

impl fmt::Display for MetaSubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable question in the bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDefinition {
    /// Unique within a bank.
    pub id: String,
    /// Statement shown to the respondent.
    pub text: String,
    /// Trait or behavior category the item scores into.
    pub category: String,
    /// Reverse-coded: a raw answer `v` scores `6 - v`.
    pub reverse: bool,
    /// Role in the form.
    pub control_kind: ControlKind,
    /// Set exactly when `control_kind` is `Meta`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_subtype: Option<MetaSubtype>,
}

impl ItemDefinition {
    /// A substantive item in `category`.
    #[must_use]
    pub fn regular(
        id: impl Into<String>,
        text: impl Into<String>,
        category: impl Into<String>,
        reverse: bool,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            category: category.into(),
            reverse,
            control_kind: ControlKind::None,
            meta_subtype: None,
        }
    }

    /// A rewording of the central probe question.
    #[must_use]
    pub fn main_control(
        id: impl Into<String>,
        text: impl Into<String>,
        category: impl Into<String>,
        reverse: bool,
    ) -> Self {
        Self {
            control_kind: ControlKind::MainControl,
            ..Self::regular(id, text, category, reverse)
        }
    }

    /// A meta item; its category defaults to the subtype name.
    #[must_use]
    pub fn meta(id: impl Into<String>, text: impl Into<String>, subtype: MetaSubtype) -> Self {
        Self {
            control_kind: ControlKind::Meta,
            meta_subtype: Some(subtype),
            ..Self::regular(id, text, subtype.as_str(), false)
        }
    }

    /// Override the reverse-coding flag.
    #[must_use]
    pub fn with_reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    /// True for substantive (non-control, non-meta) items.
    #[must_use]
    pub fn is_regular(&self) -> bool {
        self.control_kind == ControlKind::None
    }

    /// Normalize one tabular record into a definition.
    pub fn from_record(record: RawItemRecord) -> Result<Self> {
        let id = record.id.to_string().trim().to_string();
        if id.is_empty() {
            return Err(InventoryError::invalid_bank("item with empty id"));
        }
        let category = record.category.trim().to_string();
        if category.is_empty() {
            return Err(InventoryError::invalid_bank(format!(
                "item {id} has an empty category"
            )));
        }

        let raw_kind = record.control_kind.as_deref().unwrap_or_default();
        let control_kind = ControlKind::parse(raw_kind).ok_or_else(|| {
            InventoryError::invalid_bank(format!(
                "item {id} has unknown control kind {raw_kind:?}"
            ))
        })?;

        let meta_subtype = match control_kind {
            ControlKind::Meta => {
                let explicit = record.meta_subtype.as_deref().and_then(MetaSubtype::parse);
                let resolved = explicit.or_else(|| MetaSubtype::parse(&category));
                Some(resolved.ok_or_else(|| {
                    InventoryError::invalid_bank(format!(
                        "meta item {id} has no recognizable subtype (category {category:?})"
                    ))
                })?)
            }
            ControlKind::None | ControlKind::MainControl => None,
        };

        Ok(Self {
            id,
            text: record.text.trim().to_string(),
            category,
            reverse: flag_or_false(record.reverse.as_ref()),
            control_kind,
            meta_subtype,
        })
    }
}

/// Bank row as it arrives from a spreadsheet export.
///
/// Column aliases follow the usual export headers (`question`, `trait`,
/// `control_type`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawItemRecord {
    /// Item id; numeric ids are stringified.
    pub id: LooseValue,
    /// Statement text.
    #[serde(default, alias = "question")]
    pub text: String,
    /// Category tag.
    #[serde(alias = "trait")]
    pub category: String,
    /// Loose reverse flag; see [`flag_or_false`].
    #[serde(default)]
    pub reverse: Option<LooseValue>,
    /// Control kind cell; blank means a regular item.
    #[serde(default, alias = "control_type")]
    pub control_kind: Option<String>,
    /// Explicit meta subtype; falls back to the category.
    #[serde(default)]
    pub meta_subtype: Option<String>,
}

fn normalize_token(raw: &str) -> String {
    raw.trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, category: &str, kind: Option<&str>) -> RawItemRecord {
        RawItemRecord {
            id: LooseValue::from(id),
            text: format!("statement {id}"),
            category: category.to_string(),
            reverse: None,
            control_kind: kind.map(str::to_string),
            meta_subtype: None,
        }
    }

    #[test]
    fn control_kind_parses_aliases_and_blank() {
        assert_eq!(ControlKind::parse(""), Some(ControlKind::None));
        assert_eq!(ControlKind::parse(" None "), Some(ControlKind::None));
        assert_eq!(
            ControlKind::parse("main-control"),
            Some(ControlKind::MainControl)
        );
        assert_eq!(ControlKind::parse("META"), Some(ControlKind::Meta));
        assert_eq!(ControlKind::parse("sometimes"), None);
    }

    #[test]
    fn meta_subtype_parses_legacy_category_names() {
        assert_eq!(
            MetaSubtype::parse("polygraph"),
            Some(MetaSubtype::WillingnessToVerify)
        );
        assert_eq!(
            MetaSubtype::parse("honesty_meta"),
            Some(MetaSubtype::SelfReportedHonesty)
        );
        assert_eq!(
            MetaSubtype::parse("Willingness-to-verify"),
            Some(MetaSubtype::WillingnessToVerify)
        );
        assert_eq!(MetaSubtype::parse("teamwork"), None);
    }

    #[test]
    fn reserved_meta_categories_exclude_plain_honesty() {
        assert_eq!(
            MetaSubtype::from_category(" Polygraph "),
            Some(MetaSubtype::WillingnessToVerify)
        );
        assert_eq!(MetaSubtype::from_category("regret"), Some(MetaSubtype::Regret));
        assert_eq!(
            MetaSubtype::from_category("honesty_meta"),
            Some(MetaSubtype::SelfReportedHonesty)
        );
        assert_eq!(MetaSubtype::from_category("honesty"), None);
        assert_eq!(MetaSubtype::from_category("honesty_humility"), None);
    }

    #[test]
    fn record_reverse_flag_is_normalized_once() {
        let mut raw = record("7", "theft", None);
        raw.reverse = Some(LooseValue::from("TRUE"));
        let item = ItemDefinition::from_record(raw).expect("valid record");
        assert!(item.reverse);
        assert_eq!(item.id, "7");
        assert!(item.is_regular());

        let mut raw = record("8", "theft", None);
        raw.reverse = Some(LooseValue::from("maybe"));
        assert!(!ItemDefinition::from_record(raw).expect("valid").reverse);
    }

    #[test]
    fn meta_subtype_falls_back_to_category() {
        let item = ItemDefinition::from_record(record("m1", "polygraph", Some("meta")))
            .expect("resolvable subtype");
        assert_eq!(item.meta_subtype, Some(MetaSubtype::WillingnessToVerify));

        let err = ItemDefinition::from_record(record("m2", "teamwork", Some("meta")))
            .expect_err("unresolvable subtype");
        assert_eq!(err.code(), "INV-2001");
    }

    #[test]
    fn regular_items_never_carry_a_subtype() {
        let mut raw = record("r1", "regret", Some("none"));
        raw.meta_subtype = Some("regret".to_string());
        let item = ItemDefinition::from_record(raw).expect("valid");
        assert_eq!(item.meta_subtype, None);
    }

    #[test]
    fn empty_ids_and_categories_are_rejected() {
        assert!(ItemDefinition::from_record(record("  ", "theft", None)).is_err());
        assert!(ItemDefinition::from_record(record("x", " ", None)).is_err());
        assert!(ItemDefinition::from_record(record("x", "theft", Some("bogus"))).is_err());
    }

    #[test]
    fn record_deserializes_from_export_headers() {
        let raw: RawItemRecord = serde_json::from_str(
            r#"{"id": 12, "question": "I never lie", "trait": "honesty_meta",
                "reverse": 1, "control_type": "meta"}"#,
        )
        .expect("parse");
        let item = ItemDefinition::from_record(raw).expect("valid");
        assert_eq!(item.id, "12");
        assert_eq!(item.text, "I never lie");
        assert!(item.reverse);
        assert_eq!(item.meta_subtype, Some(MetaSubtype::SelfReportedHonesty));
    }
}
