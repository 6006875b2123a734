//! `medcamp schedule` - check a proposed campaign date against the lead time.

use std::io::Write;

use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;

use medcamp_core::TimePoint;
use medcamp_core::schedule::{self, ScheduleValidation};

use crate::args::parse_instant;
use crate::report_fmt;

#[derive(Args, Debug)]
pub struct ScheduleArgs {
    /// Campaign creation time (defaults to now).
    #[arg(long, value_parser = parse_instant)]
    pub created: Option<DateTime<Utc>>,

    /// Proposed execution time.
    #[arg(long, value_parser = parse_instant)]
    pub scheduled: DateTime<Utc>,

    /// Emit JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleOutput<'a> {
    #[serde(flatten)]
    validation: &'a ScheduleValidation,
    earliest_allowed: Option<DateTime<Utc>>,
}

pub fn run(
    args: &ScheduleArgs,
    now: DateTime<Utc>,
    out: &mut impl Write,
) -> anyhow::Result<ScheduleValidation> {
    let created = args.created.unwrap_or(now);
    let validation = schedule::validate(
        &TimePoint::Known(created),
        &TimePoint::Known(args.scheduled),
    );
    let earliest_allowed = schedule::earliest_allowed(created);

    if args.json {
        let output = ScheduleOutput {
            validation: &validation,
            earliest_allowed,
        };
        writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
    } else {
        report_fmt::write_schedule(out, &validation)?;
        match earliest_allowed {
            Some(at) => writeln!(out, "  Earliest allowed: {}", at.to_rfc3339())?,
            None => writeln!(out, "  Earliest allowed: beyond the supported date range")?,
        }
    }
    Ok(validation)
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: ScheduleArgs,
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 2, 9, 0, 0).unwrap()
    }

    fn run_args(argv: &[&str]) -> (ScheduleValidation, String) {
        let mut full = vec!["test"];
        full.extend_from_slice(argv);
        let cli = TestCli::parse_from(full);
        let mut buf = Vec::new();
        let validation = run(&cli.args, now(), &mut buf).unwrap();
        (validation, String::from_utf8(buf).unwrap())
    }

    #[test]
    fn parse_accepts_tuple_timestamps() {
        let cli = TestCli::parse_from(["test", "--scheduled", "2024,9,10,8,0"]);
        assert_eq!(
            cli.args.scheduled,
            Utc.with_ymd_and_hms(2024, 9, 10, 8, 0, 0).unwrap()
        );
        assert!(cli.args.created.is_none());
    }

    #[test]
    fn parse_rejects_unreadable_dates() {
        assert!(TestCli::try_parse_from(["test", "--scheduled", "next week"]).is_err());
    }

    #[test]
    fn created_defaults_to_now() {
        let (validation, out) = run_args(&["--scheduled", "2024-09-05T09:00:00Z"]);
        assert!(!validation.is_valid);
        assert_eq!(validation.days_difference, 3);
        assert!(out.starts_with("REJECTED:"));
        assert!(out.contains("2024-09-06T09:00:00+00:00"));
    }

    #[test]
    fn explicit_creation_date_is_used() {
        let (validation, out) = run_args(&[
            "--created",
            "2024-08-01T00:00:00Z",
            "--scheduled",
            "2024-08-05T00:00:00Z",
        ]);
        assert!(validation.is_valid);
        assert_eq!(validation.days_difference, 4);
        assert!(out.starts_with("OK:"));
    }

    #[test]
    fn far_future_creation_is_rejected_without_earliest_date() {
        let (validation, out) = run_args(&[
            "--created",
            "262142,12,30,0,0",
            "--scheduled",
            "262142,12,31,0,0",
        ]);
        assert!(!validation.is_valid);
        assert!(out.contains("beyond the supported date range"));
    }

    #[test]
    fn json_output_flattens_validation() {
        let (_, out) = run_args(&["--scheduled", "2024-09-20T09:00:00Z", "--json"]);
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["isValid"], true);
        assert_eq!(v["daysDifference"], 18);
        assert_eq!(v["earliestAllowed"], "2024-09-06T09:00:00Z");
    }
}
