//! Profile fit: distance of aggregated trait means from a target-range table.

#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::config::{Config, FitConfig};
use crate::core::errors::{InventoryError, Result};
use crate::scoring::aggregate::ScoreSummary;

/// Inclusive ideal band for one trait.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraitRange {
    /// Lowest ideal mean.
    pub low: f64,
    /// Highest ideal mean.
    pub high: f64,
}

impl TraitRange {
    /// Band from `low` to `high`, both inclusive.
    #[must_use]
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Boundaries are inside the band.
    #[must_use]
    pub fn contains(&self, score: f64) -> bool {
        (self.low..=self.high).contains(&score)
    }

    /// Center of the band.
    #[must_use]
    pub fn midpoint(&self) -> f64 {
        f64::midpoint(self.low, self.high)
    }

    /// Distance to the band; 0 inside it.
    #[must_use]
    pub fn distance(&self, score: f64) -> f64 {
        if score < self.low {
            self.low - score
        } else if score > self.high {
            score - self.high
        } else {
            0.0
        }
    }
}

/// Read-only trait → ideal-range table for the profile being screened for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetProfile {
    ranges: BTreeMap<String, TraitRange>,
}

impl Default for TargetProfile {
    /// HEXACO screening profile for clinical-track candidates.
    fn default() -> Self {
        Self::new([
            ("honesty_humility", TraitRange::new(4.0, 5.0)),
            ("emotionality", TraitRange::new(2.5, 3.8)),
            ("extraversion", TraitRange::new(3.2, 4.3)),
            ("agreeableness", TraitRange::new(3.5, 4.5)),
            ("conscientiousness", TraitRange::new(4.0, 5.0)),
            ("openness", TraitRange::new(3.4, 4.5)),
        ])
    }
}

impl TargetProfile {
    /// Profile from `(trait, range)` pairs; later duplicates win.
    pub fn new<K: Into<String>>(ranges: impl IntoIterator<Item = (K, TraitRange)>) -> Self {
        Self {
            ranges: ranges
                .into_iter()
                .map(|(name, range)| (name.into(), range))
                .collect(),
        }
    }

    /// Ideal band for `trait_name`, if profiled.
    #[must_use]
    pub fn get(&self, trait_name: &str) -> Option<&TraitRange> {
        self.ranges.get(trait_name)
    }

    /// Traits in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TraitRange)> {
        self.ranges.iter().map(|(name, range)| (name.as_str(), range))
    }

    /// Number of profiled traits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// True when no trait is profiled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for (name, range) in &self.ranges {
            let in_scale = |v: f64| (1.0..=5.0).contains(&v);
            if !in_scale(range.low) || !in_scale(range.high) || range.low > range.high {
                return Err(InventoryError::InvalidConfig {
                    details: format!(
                        "profile.{name} must satisfy 1 <= low <= high <= 5, got [{}, {}]",
                        range.low, range.high
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Traffic-light status of one trait against its band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitStatus {
    /// Inside the band.
    Green,
    /// Outside the band by at most the yellow margin.
    Yellow,
    /// Further out.
    Red,
}

/// Per-trait fit detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitFit {
    /// Profiled trait.
    pub trait_name: String,
    /// Aggregated mean for the trait.
    pub mean_score: f64,
    /// Ideal band it was measured against.
    pub range: TraitRange,
    /// Traffic-light reading.
    pub status: FitStatus,
    /// Weighted distance contributed to the total penalty.
    pub penalty: f64,
}

/// Profile fit with its per-trait breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    /// 0–100; 0 when no summarized trait appears in the profile.
    pub score: u8,
    /// Sum of per-trait penalties.
    pub total_penalty: f64,
    /// Matched traits in summary order.
    pub traits: Vec<TraitFit>,
}

/// Scores summaries against a fixed target profile.
#[derive(Debug, Clone)]
pub struct ProfileFitScorer {
    profile: TargetProfile,
    config: FitConfig,
}

impl ProfileFitScorer {
    /// Scorer for `profile` with the given weights.
    #[must_use]
    pub fn new(profile: TargetProfile, config: FitConfig) -> Self {
        Self { profile, config }
    }

    /// Scorer for the configured profile and weights.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.profile.clone(), config.fit.clone())
    }

    /// Target profile in use.
    #[must_use]
    pub fn profile(&self) -> &TargetProfile {
        &self.profile
    }

    /// Fit percentage only.
    #[must_use]
    pub fn score_fit(&self, summaries: &[ScoreSummary]) -> u8 {
        self.evaluate(summaries).score
    }

    /// Fit percentage with per-trait detail, in summary order.
    ///
    /// Falling short of a band costs `under_weight` per point, overshooting
    /// costs `over_weight` per point; the total is scaled by `scale` and
    /// subtracted from 100.
    #[must_use]
    pub fn evaluate(&self, summaries: &[ScoreSummary]) -> FitReport {
        let traits: Vec<TraitFit> = summaries
            .iter()
            .filter_map(|summary| {
                let range = *self.profile.get(&summary.category)?;
                Some(self.trait_fit(&summary.category, summary.mean_score, range))
            })
            .collect();

        let total_penalty: f64 = traits.iter().map(|fit| fit.penalty).sum();
        let score = if traits.is_empty() {
            0
        } else {
            total_penalty
                .mul_add(-self.config.scale, 100.0)
                .clamp(0.0, 100.0)
                .round() as u8
        };

        tracing::debug!(
            matched = traits.len(),
            total_penalty,
            score,
            "profile fit evaluated"
        );
        FitReport {
            score,
            total_penalty,
            traits,
        }
    }

    fn trait_fit(&self, trait_name: &str, mean_score: f64, range: TraitRange) -> TraitFit {
        let penalty = if mean_score < range.low {
            (range.low - mean_score) * self.config.under_weight
        } else if mean_score > range.high {
            (mean_score - range.high) * self.config.over_weight
        } else {
            0.0
        };
        let distance = range.distance(mean_score);
        let status = if distance <= 0.0 {
            FitStatus::Green
        } else if distance <= self.config.yellow_margin {
            FitStatus::Yellow
        } else {
            FitStatus::Red
        };
        TraitFit {
            trait_name: trait_name.to_string(),
            mean_score,
            range,
            status,
            penalty,
        }
    }
}

/// Fit against `targets` with default penalty weights.
#[must_use]
pub fn score_fit(summaries: &[ScoreSummary], targets: &TargetProfile) -> u8 {
    ProfileFitScorer::new(targets.clone(), FitConfig::default()).score_fit(summaries)
}
