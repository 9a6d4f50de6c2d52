//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use integrity_inventory::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{InventoryError, Result};
pub use crate::core::loose::LooseValue;

// Bank
pub use crate::bank::item::{ControlKind, ItemDefinition, MetaSubtype};
pub use crate::bank::registry::ItemBank;

// Sampler
pub use crate::sampler::form::{FormEntry, TestForm};
pub use crate::sampler::stratify::{FormSampler, build_form};

// Scoring
pub use crate::scoring::aggregate::{ScoreSummary, aggregate};
pub use crate::scoring::response::{ItemResponse, LatencyStatus, RawResponseRecord, load_responses};
pub use crate::scoring::transform::transform;

// Analysis
pub use crate::analysis::contradictions::{
    ContradictionDetector, ContradictionKind, ContradictionRecord, Severity, detect,
};
pub use crate::analysis::fit::{FitReport, ProfileFitScorer, TargetProfile, TraitRange, score_fit};
pub use crate::analysis::reliability::{
    ReliabilityBand, ReliabilityReport, ReliabilityScorer, score_reliability,
};
pub use crate::analysis::report::{AnalysisReport, Analyzer};
pub use crate::analysis::risk::{CategoryRisk, RiskLevel};
