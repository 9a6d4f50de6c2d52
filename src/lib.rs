#![forbid(unsafe_code)]

//! Integrity inventory engine: assembles balanced question forms from a
//! tagged item bank and turns timed Likert responses into trait scores, a
//! reliability verdict and a profile-fit metric.
//!
//! Pipeline:
//! 1. **Form sampling**: stratified draw across categories with periodic
//!    meta-item injection and randomly placed control rewordings
//! 2. **Scoring**: reverse coding and per-category aggregation
//! 3. **Analysis**: contradiction detection, reliability index, profile fit
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use integrity_inventory::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use integrity_inventory::core::config::Config;
//! use integrity_inventory::sampler::stratify::FormSampler;
//! ```

pub mod prelude;

pub mod analysis;
pub mod bank;
pub mod core;
pub mod sampler;
pub mod scoring;
