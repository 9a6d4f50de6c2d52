//! Form assembly from an item bank.

pub mod form;
pub mod stratify;
