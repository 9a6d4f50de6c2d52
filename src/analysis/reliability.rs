//! Reliability index: 100 minus additive penalties for fast answers,
//! contradictions, flat responding, extreme responding and low willingness
//! to verify.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use serde::Serialize;

use crate::analysis::contradictions::{ContradictionDetector, ContradictionRecord, severity_counts};
use crate::bank::item::{ControlKind, MetaSubtype};
use crate::core::config::{Config, ContradictionConfig, ReliabilityConfig};
use crate::scoring::aggregate::{mean, sample_std};
use crate::scoring::response::ItemResponse;

/// Interpretation band for the 0–100 index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReliabilityBand {
    /// Below 40.
    VeryLow,
    /// 40 to 59.
    Low,
    /// 60 to 74.
    Moderate,
    /// 75 to 89.
    High,
    /// 90 and above.
    VeryHigh,
}

impl ReliabilityBand {
    /// Band containing `score`.
    #[must_use]
    pub const fn from_score(score: u8) -> Self {
        match score {
            90.. => Self::VeryHigh,
            75..=89 => Self::High,
            60..=74 => Self::Moderate,
            40..=59 => Self::Low,
            _ => Self::VeryLow,
        }
    }

    /// Canonical snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VeryHigh => "very_high",
            Self::High => "high",
            Self::Moderate => "moderate",
            Self::Low => "low",
            Self::VeryLow => "very_low",
        }
    }

    /// One-sentence reading for reports.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::VeryHigh => "Answers are consistent and credible.",
            Self::High => "Good reliability; minor inconsistencies only.",
            Self::Moderate => "Some inconsistency; review the answers carefully.",
            Self::Low => "Low reliability; significant contradictions found.",
            Self::VeryLow => "Critical: answers are unreliable and contradict each other.",
        }
    }
}

/// One applied penalty source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PenaltyTerm {
    /// Stable identifier of the penalty source.
    pub name: &'static str,
    /// Measured quantity that triggered the penalty (ratio, count, std or mean).
    pub value: f64,
    /// Points subtracted from 100.
    pub contribution: f64,
}

/// Reliability index with the records and penalties behind it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReliabilityReport {
    /// 0-100 after clamping and rounding.
    pub score: u8,
    /// Interpretation of `score`.
    pub band: ReliabilityBand,
    /// Records found by the contradiction checks.
    pub contradictions: Vec<ContradictionRecord>,
    /// Applied penalties in evaluation order.
    pub penalties: Vec<PenaltyTerm>,
}

impl ReliabilityReport {
    fn empty() -> Self {
        Self {
            score: 0,
            band: ReliabilityBand::VeryLow,
            contradictions: Vec::new(),
            penalties: Vec::new(),
        }
    }

    /// Sum of contributions, before clamping.
    #[must_use]
    pub fn total_penalty(&self) -> f64 {
        self.penalties.iter().map(|term| term.contribution).sum()
    }
}

/// Additive penalty scorer over a response set.
#[derive(Debug, Clone)]
pub struct ReliabilityScorer {
    config: ReliabilityConfig,
    detector: ContradictionDetector,
}

impl Default for ReliabilityScorer {
    fn default() -> Self {
        Self::from_config(&ReliabilityConfig::default(), &ContradictionConfig::default())
    }
}

impl ReliabilityScorer {
    /// Scorer with explicit penalty and contradiction thresholds.
    #[must_use]
    pub fn from_config(
        reliability: &ReliabilityConfig,
        contradictions: &ContradictionConfig,
    ) -> Self {
        Self {
            config: reliability.clone(),
            detector: ContradictionDetector::from_config(contradictions),
        }
    }

    /// Scorer with the thresholds from `config`.
    #[must_use]
    pub fn from_full_config(config: &Config) -> Self {
        Self::from_config(&config.reliability, &config.contradictions)
    }

    /// Score a full response set. An empty set scores 0.
    #[must_use]
    pub fn score(&self, responses: &[ItemResponse]) -> ReliabilityReport {
        if responses.is_empty() {
            return ReliabilityReport::empty();
        }
        let cfg = &self.config;
        let total = responses.len() as f64;
        let mut penalties = Vec::new();
        let mut apply = |name: &'static str, value: f64, contribution: f64| {
            if contribution > 0.0 {
                penalties.push(PenaltyTerm {
                    name,
                    value,
                    contribution,
                });
            }
        };

        let fast = responses
            .iter()
            .filter(|r| r.latency_seconds < cfg.fast_latency_secs)
            .count() as f64;
        apply("fast_latency", fast / total, fast / total * cfg.latency_weight);

        let contradictions = self.detector.detect(responses);
        let (critical, high) = severity_counts(&contradictions);
        apply(
            "contradictions",
            (critical + high) as f64,
            (critical as f64).mul_add(cfg.critical_penalty, high as f64 * cfg.high_penalty),
        );

        if responses.len() >= cfg.variance_min_responses {
            let scores: Vec<f64> = responses.iter().map(|r| f64::from(r.score())).collect();
            let std = sample_std(&scores);
            let penalty = if std < cfg.variance_severe_std {
                cfg.variance_severe_penalty
            } else if std < cfg.variance_mild_std {
                cfg.variance_mild_penalty
            } else {
                0.0
            };
            apply("flat_responding", std, penalty);
        }

        let ratio_of = |answer: u8| {
            responses.iter().filter(|r| r.raw_answer() == answer).count() as f64 / total
        };
        let extreme = ratio_of(5).max(ratio_of(1));
        if extreme > cfg.extreme_ratio {
            apply("extreme_responding", extreme, cfg.extreme_penalty);
        }

        let willingness: Vec<f64> = responses
            .iter()
            .filter(|r| is_willingness_item(r))
            .map(|r| f64::from(r.raw_answer()))
            .collect();
        if !willingness.is_empty() {
            let avg = mean(&willingness);
            if avg <= cfg.willingness_max_mean {
                apply("low_willingness_to_verify", avg, cfg.willingness_penalty);
            }
        }

        let total_penalty: f64 = penalties.iter().map(|term| term.contribution).sum();
        let score = (100.0 - total_penalty).clamp(0.0, 100.0).round() as u8;
        let band = ReliabilityBand::from_score(score);
        tracing::debug!(
            responses = responses.len(),
            critical,
            high,
            total_penalty,
            score,
            band = band.as_str(),
            "reliability scored"
        );
        ReliabilityReport {
            score,
            band,
            contradictions,
            penalties,
        }
    }
}

/// Score with default thresholds.
#[must_use]
pub fn score_reliability(responses: &[ItemResponse]) -> ReliabilityReport {
    ReliabilityScorer::default().score(responses)
}

fn is_willingness_item(response: &ItemResponse) -> bool {
    let subtype = response.meta_subtype.or_else(|| {
        (response.control_kind == ControlKind::Meta)
            .then(|| MetaSubtype::parse(&response.category))
            .flatten()
    });
    subtype == Some(MetaSubtype::WillingnessToVerify)
}
