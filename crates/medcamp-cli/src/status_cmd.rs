//! `medcamp status` - classify every record in an export.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;

use medcamp_core::deadline;
use medcamp_core::reconcile::StatusCounts;
use medcamp_core::{ConsentRecord, ConsentStatus, records};

use crate::report_fmt;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Record export (JSON array or NDJSON).
    pub file: PathBuf,

    /// Only list records with this status (e.g. awaiting-response).
    #[arg(long)]
    pub only: Option<ConsentStatus>,

    /// Emit JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordStatus<'a> {
    id: &'a str,
    subject_id: &'a str,
    status: ConsentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    remaining_hours: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusOutput<'a> {
    evaluated_at: DateTime<Utc>,
    counts: StatusCounts,
    records: Vec<RecordStatus<'a>>,
}

fn classify(record: &ConsentRecord, now: DateTime<Utc>) -> RecordStatus<'_> {
    let status = record.current_status(now);
    let remaining_hours = match (status, &record.sent_at) {
        (ConsentStatus::AwaitingResponse, Some(sent_at)) => {
            Some(deadline::validate_parent_form_action(sent_at, now).remaining_hours)
        }
        _ => None,
    };
    RecordStatus {
        id: &record.id,
        subject_id: &record.subject_id,
        status,
        remaining_hours,
    }
}

pub fn run(args: &StatusArgs, now: DateTime<Utc>, out: &mut impl Write) -> anyhow::Result<()> {
    let all = records::load_snapshot(&args.file)
        .with_context(|| format!("Failed to load records from {}", args.file.display()))?;
    tracing::debug!(count = all.len(), path = %args.file.display(), "Loaded records");

    let counts = StatusCounts::tally(&all, now);
    let listed: Vec<RecordStatus<'_>> = all
        .iter()
        .map(|r| classify(r, now))
        .filter(|r| args.only.is_none_or(|only| r.status == only))
        .collect();

    if args.json {
        let output = StatusOutput {
            evaluated_at: now,
            counts,
            records: listed,
        };
        writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
        return Ok(());
    }

    if listed.is_empty() {
        writeln!(out, "No matching records.")?;
    } else {
        writeln!(out, "{:<24} {:<18} REMAINING", "ID", "STATUS")?;
        for r in &listed {
            let remaining = r
                .remaining_hours
                .map_or_else(|| "-".to_string(), deadline::format_time_remaining);
            writeln!(out, "{:<24} {:<18} {remaining}", r.id, r.status.as_str())?;
        }
    }
    writeln!(out)?;
    writeln!(out, "Evaluated at: {}", now.to_rfc3339())?;
    report_fmt::write_counts(out, &counts)?;
    Ok(())
}
