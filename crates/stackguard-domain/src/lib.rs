//! Pure safeguard evaluation (no IO).
//!
//! Input: a compiled template plus deployment metadata, constructed elsewhere.
//! Output: per-rule outcomes + findings + verdict.

#![forbid(unsafe_code)]

pub mod intrinsic;
pub mod model;
pub mod policy;
pub mod report;
pub mod rules;
pub mod verdict;
pub mod walker;

mod engine;
mod fingerprint;

#[cfg(test)]
mod proptest;
#[cfg(test)]
mod test_support;

pub use engine::{evaluate, evaluate_rules};
