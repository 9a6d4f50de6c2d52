//! Scoring: reverse-coding transform, response ingestion, per-category aggregation.

pub mod aggregate;
pub mod response;
pub mod transform;
