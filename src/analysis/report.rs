//! One-call analysis of a completed response set.

use serde::Serialize;

use crate::analysis::fit::{FitReport, ProfileFitScorer};
use crate::analysis::reliability::{ReliabilityReport, ReliabilityScorer};
use crate::analysis::risk::{CategoryRisk, assess};
use crate::core::config::{Config, RiskConfig};
use crate::scoring::aggregate::{ScoreSummary, aggregate};
use crate::scoring::response::{ItemResponse, LatencyStatus};

/// Answer-speed tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LatencyCounts {
    /// Answered faster than the fast threshold.
    pub too_fast: usize,
    /// Answered within bounds.
    pub normal: usize,
    /// Answered slower than the slow threshold.
    pub too_slow: usize,
}

impl LatencyCounts {
    fn record(&mut self, status: LatencyStatus) {
        match status {
            LatencyStatus::TooFast => self.too_fast += 1,
            LatencyStatus::Normal => self.normal += 1,
            LatencyStatus::TooSlow => self.too_slow += 1,
        }
    }
}

/// Everything downstream collaborators consume. Reliability and fit are
/// independent axes computed from the same responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// Responses analyzed.
    pub response_count: usize,
    /// Per-category aggregates in first-appearance order.
    pub summaries: Vec<ScoreSummary>,
    /// Risk level per summarized category.
    pub risks: Vec<CategoryRisk>,
    /// Reliability index, its penalty ledger and the contradictions behind it.
    pub reliability: ReliabilityReport,
    /// Fit against the configured target profile.
    pub fit: FitReport,
    /// Answer-speed tally.
    pub latency: LatencyCounts,
}

/// Bundles the configured scorers.
#[derive(Debug, Clone)]
pub struct Analyzer {
    reliability: ReliabilityScorer,
    fit: ProfileFitScorer,
    risk: RiskConfig,
    fast_latency_secs: f64,
    slow_latency_secs: f64,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl Analyzer {
    /// Analyzer using every threshold and the target profile from `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            reliability: ReliabilityScorer::from_full_config(config),
            fit: ProfileFitScorer::from_config(config),
            risk: config.risk.clone(),
            fast_latency_secs: config.reliability.fast_latency_secs,
            slow_latency_secs: config.reliability.slow_latency_secs,
        }
    }

    /// Aggregate, score and classify one response set.
    #[must_use]
    pub fn analyze(&self, responses: &[ItemResponse]) -> AnalysisReport {
        let summaries = aggregate(responses);
        let risks = assess(&summaries, &self.risk);
        let reliability = self.reliability.score(responses);
        let fit = self.fit.evaluate(&summaries);

        let mut latency = LatencyCounts::default();
        for response in responses {
            latency.record(response.latency_status(self.fast_latency_secs, self.slow_latency_secs));
        }

        tracing::debug!(
            responses = responses.len(),
            categories = summaries.len(),
            reliability = reliability.score,
            fit = fit.score,
            "analysis complete"
        );
        AnalysisReport {
            response_count: responses.len(),
            summaries,
            risks,
            reliability,
            fit,
            latency,
        }
    }
}
