//! Stable DTOs and IDs used across the stackguard workspace.
//!
//! This crate is intentionally boring:
//! - data types for the emitted report
//! - stable rule IDs and finding codes
//! - canonical property pointers into a template
//! - explain registry for remediation guidance

#![forbid(unsafe_code)]

pub mod explain;
pub mod ids;
pub mod pointer;
pub mod receipt;

pub use explain::{ExamplePair, Explanation, lookup_explanation};
pub use pointer::PropertyPointer;
pub use receipt::{
    Finding, Location, RuleStatus, RuleSummary, RunMeta, SCHEMA_REPORT_V1, Severity,
    StackguardData, StackguardReport, ToolMeta, VerdictCounts, VerdictStatus, VerdictSummary,
};
