//! Per-category aggregation: mean score, mean latency, sample standard deviation.

#![allow(clippy::cast_precision_loss)]

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::scoring::response::ItemResponse;

/// Aggregate for one trait/category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    /// Category tag shared by the grouped responses.
    pub category: String,
    /// Arithmetic mean of transformed scores.
    pub mean_score: f64,
    /// Arithmetic mean of answer latencies in seconds.
    pub mean_latency: f64,
    /// Sample standard deviation (ddof = 1) of scores; 0 for a single response.
    pub score_std: f64,
    /// Number of responses in the group.
    pub sample_count: usize,
}

/// Group responses by category, in order of first appearance.
///
/// Every response lands in exactly one row, so the `sample_count`s sum to
/// `responses.len()`.
#[must_use]
pub fn aggregate(responses: &[ItemResponse]) -> Vec<ScoreSummary> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&ItemResponse>> = HashMap::new();
    for response in responses {
        let key = response.category.as_str();
        groups
            .entry(key)
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(response);
    }

    let summaries: Vec<ScoreSummary> = order
        .into_iter()
        .map(|category| {
            let group = &groups[category];
            let scores: Vec<f64> = group.iter().map(|r| f64::from(r.score())).collect();
            let latencies: Vec<f64> = group.iter().map(|r| r.latency_seconds).collect();
            ScoreSummary {
                category: category.to_string(),
                mean_score: mean(&scores),
                mean_latency: mean(&latencies),
                score_std: sample_std(&scores),
                sample_count: group.len(),
            }
        })
        .collect();

    tracing::debug!(
        responses = responses.len(),
        categories = summaries.len(),
        "aggregated responses"
    );
    summaries
}

/// Arithmetic mean; 0 for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (ddof = 1); 0 when fewer than two values.
#[must_use]
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let center = mean(values);
    let sum_sq: f64 = values.iter().map(|value| (value - center).powi(2)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}
