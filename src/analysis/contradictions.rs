//! Contradiction detection: same-category pairs, main-control breaches,
//! inconsistent meta groups.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::bank::item::{ControlKind, MetaSubtype};
use crate::core::config::ContradictionConfig;
use crate::scoring::aggregate::sample_std;
use crate::scoring::response::ItemResponse;

/// Which check produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContradictionKind {
    /// Two regular items of one category answered far apart.
    CategoryPair,
    /// Main-control rewordings answered inconsistently.
    ControlBreach,
    /// Meta items of one subtype with too wide a spread.
    MetaInconsistency,
}

/// Weight class of a record in the reliability index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Ordinary inconsistency.
    High,
    /// Inconsistency across main-control rewordings.
    Critical,
}

impl Severity {
    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Measured spread that tripped the check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Spread {
    /// Absolute score difference (pairs) or `max - min` (controls).
    Diff(f64),
    /// Sample standard deviation of a meta group.
    Std(f64),
}

impl Spread {
    /// The measured number, whichever kind it is.
    #[must_use]
    pub const fn value(self) -> f64 {
        match self {
            Self::Diff(value) | Self::Std(value) => value,
        }
    }
}

/// An offending answer quoted as evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemEvidence {
    /// Id of the quoted item.
    pub item_id: String,
    /// Wording, when the response carried it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Answer as given.
    pub raw_answer: u8,
    /// Reverse-adjusted score.
    pub score: u8,
}

impl ItemEvidence {
    fn of(response: &ItemResponse) -> Self {
        Self {
            item_id: response.item_id.clone(),
            text: response.text.clone(),
            raw_answer: response.raw_answer(),
            score: response.score(),
        }
    }
}

/// One detected inconsistency. Derived fresh on every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContradictionRecord {
    /// Check that fired.
    pub kind: ContradictionKind,
    /// Category, control category, or meta group key.
    pub category: String,
    /// Weight class.
    pub severity: Severity,
    /// Value that crossed the threshold.
    pub spread: Spread,
    /// Both items of a pair; the extreme pair of a control breach; empty for meta groups.
    pub items: Vec<ItemEvidence>,
    /// Human-readable summary.
    pub message: String,
}

/// Runs the three independent checks with configured thresholds.
#[derive(Debug, Clone)]
pub struct ContradictionDetector {
    config: ContradictionConfig,
}

impl Default for ContradictionDetector {
    fn default() -> Self {
        Self::from_config(&ContradictionConfig::default())
    }
}

impl ContradictionDetector {
    /// Detector with the given thresholds.
    #[must_use]
    pub fn from_config(config: &ContradictionConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Concatenate category-pair, control-breach and meta records, in that
    /// order. No deduplication across checks.
    #[must_use]
    pub fn detect(&self, responses: &[ItemResponse]) -> Vec<ContradictionRecord> {
        let mut records = self.category_pairs(responses);
        records.extend(self.control_breach(responses));
        records.extend(self.meta_inconsistencies(responses));
        tracing::debug!(
            responses = responses.len(),
            contradictions = records.len(),
            "contradiction scan complete"
        );
        records
    }

    fn category_pairs(&self, responses: &[ItemResponse]) -> Vec<ContradictionRecord> {
        let regular = responses
            .iter()
            .filter(|response| response.control_kind == ControlKind::None)
            .filter(|response| MetaSubtype::from_category(&response.category).is_none());
        let mut records = Vec::new();
        for (category, group) in group_in_order(regular, |r| r.category.clone()) {
            for (i, first) in group.iter().enumerate() {
                for second in &group[i + 1..] {
                    let diff = (f64::from(first.score()) - f64::from(second.score())).abs();
                    if diff >= self.config.category_pair_min_diff {
                        records.push(ContradictionRecord {
                            kind: ContradictionKind::CategoryPair,
                            message: format!(
                                "items {} and {} in '{category}' differ by {diff}",
                                first.item_id, second.item_id
                            ),
                            category: category.clone(),
                            severity: Severity::High,
                            spread: Spread::Diff(diff),
                            items: vec![ItemEvidence::of(first), ItemEvidence::of(second)],
                        });
                    }
                }
            }
        }
        records
    }

    fn control_breach(&self, responses: &[ItemResponse]) -> Option<ContradictionRecord> {
        let controls: Vec<&ItemResponse> = responses
            .iter()
            .filter(|response| response.control_kind == ControlKind::MainControl)
            .collect();
        if controls.len() < 2 {
            return None;
        }
        // First occurrence wins ties so the evidence is stable.
        let mut low = controls[0];
        let mut high = controls[0];
        for &response in &controls[1..] {
            if response.score() < low.score() {
                low = response;
            }
            if response.score() > high.score() {
                high = response;
            }
        }
        let spread = f64::from(high.score() - low.score());
        if spread < self.config.control_breach_min_spread {
            return None;
        }
        Some(ContradictionRecord {
            kind: ContradictionKind::ControlBreach,
            category: high.category.clone(),
            severity: Severity::Critical,
            spread: Spread::Diff(spread),
            items: vec![ItemEvidence::of(high), ItemEvidence::of(low)],
            message: format!(
                "{} rewordings of the same control question received answers {spread} apart",
                controls.len()
            ),
        })
    }

    fn meta_inconsistencies(&self, responses: &[ItemResponse]) -> Vec<ContradictionRecord> {
        let meta = responses
            .iter()
            .filter(|response| response.control_kind == ControlKind::Meta);
        let groups = group_in_order(meta, |response| {
            response
                .meta_subtype
                .map_or_else(|| response.category.clone(), |subtype| subtype.as_str().to_string())
        });

        groups
            .into_iter()
            .filter(|(_, group)| group.len() >= 2)
            .filter_map(|(key, group)| {
                let scores: Vec<f64> = group.iter().map(|r| f64::from(r.score())).collect();
                let std = sample_std(&scores);
                (std > self.config.meta_max_std).then(|| ContradictionRecord {
                    kind: ContradictionKind::MetaInconsistency,
                    message: format!(
                        "{} answers to '{key}' meta items are inconsistent (std {std:.2})",
                        group.len()
                    ),
                    category: key,
                    severity: Severity::High,
                    spread: Spread::Std(std),
                    items: Vec::new(),
                })
            })
            .collect()
    }
}

/// Detect with default thresholds.
#[must_use]
pub fn detect(responses: &[ItemResponse]) -> Vec<ContradictionRecord> {
    ContradictionDetector::default().detect(responses)
}

/// Count records per severity as `(critical, high)`.
#[must_use]
pub fn severity_counts(records: &[ContradictionRecord]) -> (usize, usize) {
    records
        .iter()
        .fold((0, 0), |(critical, high), record| match record.severity {
            Severity::Critical => (critical + 1, high),
            Severity::High => (critical, high + 1),
        })
}

fn group_in_order<'a, I, K>(responses: I, key: K) -> Vec<(String, Vec<&'a ItemResponse>)>
where
    I: Iterator<Item = &'a ItemResponse>,
    K: Fn(&ItemResponse) -> String,
{
    let mut groups: Vec<(String, Vec<&'a ItemResponse>)> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();
    for response in responses {
        let name = key(response);
        let slot = *slots.entry(name.clone()).or_insert_with(|| {
            groups.push((name, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(response);
    }
    groups
}
