//! Item bank: question definitions grouped by category, control kind and meta subtype.

pub mod item;
pub mod registry;
