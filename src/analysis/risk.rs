//! Per-category risk levels from aggregated means.

use serde::{Deserialize, Serialize};

use crate::core::config::RiskConfig;
use crate::scoring::aggregate::ScoreSummary;

/// Coarse risk reading of one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// No concern.
    Low,
    /// Worth a follow-up.
    Moderate,
    /// Flag for review.
    High,
}

impl RiskLevel {
    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }
}

/// Risk reading for one summarized category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRisk {
    /// Category name.
    pub category: String,
    /// Mean reverse-adjusted score.
    pub mean_score: f64,
    /// Critical categories read a low mean as admitted misconduct.
    pub critical: bool,
    /// Classified level.
    pub level: RiskLevel,
}

/// Classify one category mean.
///
/// Critical categories: `<= 2` high, `<= 3` moderate. Others are
/// higher-is-better: `>= 4` low, `>= 3` moderate.
#[must_use]
pub fn classify(mean_score: f64, critical: bool) -> RiskLevel {
    if critical {
        if mean_score <= 2.0 {
            RiskLevel::High
        } else if mean_score <= 3.0 {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        }
    } else if mean_score >= 4.0 {
        RiskLevel::Low
    } else if mean_score >= 3.0 {
        RiskLevel::Moderate
    } else {
        RiskLevel::High
    }
}

/// Risk rows in summary order.
#[must_use]
pub fn assess(summaries: &[ScoreSummary], config: &RiskConfig) -> Vec<CategoryRisk> {
    summaries
        .iter()
        .map(|summary| {
            let critical = config
                .critical_categories
                .iter()
                .any(|name| name == &summary.category);
            CategoryRisk {
                category: summary.category.clone(),
                mean_score: summary.mean_score,
                critical,
                level: classify(summary.mean_score, critical),
            }
        })
        .collect()
}
