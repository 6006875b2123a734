//! Argument parsers shared by the subcommands.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use medcamp_core::deadline::WorkflowKind;
use medcamp_core::time_point::{RawTimestamp, try_normalize};

/// Parse an instant from the command line.
///
/// Accepts every string form the record reader accepts, plus a comma-separated
/// tuple such as `2024,5,1,9,30` (1-indexed month). Unlike record fields, an
/// unreadable value is an error here.
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>, String> {
    let parts: Option<Vec<i64>> = s
        .split(',')
        .map(|p| p.trim().parse::<i64>().ok())
        .collect();
    let raw = match parts {
        Some(parts) if parts.len() > 1 => RawTimestamp::Parts(parts),
        _ => RawTimestamp::from(s),
    };
    try_normalize(&raw).map_err(|e| e.to_string())
}

/// Workflow selector for `medcamp window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// Guardian consent form (48h)
    Parent,
    /// Manager campaign approval (24h)
    Manager,
}

impl From<KindArg> for WorkflowKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Parent => Self::ParentResponse,
            KindArg::Manager => Self::ManagerApproval,
        }
    }
}
