//! Use case orchestration for stackguard.
//!
//! This crate provides the application layer: use cases that coordinate template loading,
//! config resolution, the domain engine, and the render layer. It is intentionally thin.
//!
//! The CLI crate depends on this; it only handles argument parsing and I/O.

#![forbid(unsafe_code)]

mod check;
mod explain;
mod render;
mod report;
mod template;

pub use check::{CheckInput, CheckOutput, run_check, verdict_exit_code};
pub use explain::{
    ExplainOutput, RuleExplanation, format_explanation, format_not_found, run_explain,
};
pub use render::{render_annotations, render_markdown};
pub use report::{parse_report_json, runtime_error_report, serialize_report, to_renderable};
pub use template::{TemplateFormat, load_template, parse_template};
