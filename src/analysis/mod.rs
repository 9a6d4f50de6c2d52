//! Analysis of completed response sets: contradictions, reliability, fit, risk.

pub mod contradictions;
pub mod fit;
pub mod reliability;
pub mod report;
pub mod risk;
