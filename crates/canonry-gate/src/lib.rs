//! Gate orchestration.
//!
//! Runs the registration pass and the lifecycle guard in-process, checks
//! the required canon layout, and merges the three results into one
//! completeness report with a fixed exit-code mapping:
//! `0` all gates pass, `1` registration failed, `2` guard disallowed,
//! `3` required canon files missing. The report is always produced before
//! the exit code is applied, so calling automation never has to guess a
//! failure from a missing report.

#![deny(unsafe_code)]

pub mod gitinfo;
pub mod orchestrator;
pub mod render;
pub mod report;

pub use gitinfo::git_head;
pub use orchestrator::{exit_code, run_gates, write_report, GateOptions};
pub use render::{render_block, render_markdown};
pub use report::{GateReport, GateSummary, GuardSection, LayoutSection, RegistrationSection};
