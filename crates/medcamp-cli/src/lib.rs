//! `MedCamp` CLI Library
//!
//! Operational tooling over consent-record exports: per-record status,
//! reconciliation drift checks, schedule lead-time checks and single
//! deadline-window evaluation. User-facing output uses `writeln!` to the
//! writer each command is given; logs go to stderr.

pub mod args;
pub mod reconcile_cmd;
pub mod report_fmt;
pub mod schedule_cmd;
pub mod status_cmd;
pub mod window_cmd;
