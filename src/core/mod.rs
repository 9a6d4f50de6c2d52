//! Core types: errors, configuration, loose tabular cells.

pub mod config;
pub mod errors;
pub mod loose;
