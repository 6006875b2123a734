//! `medcamp reconcile` - compare status-derived counts with a confirmed-only export.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Args;

use medcamp_core::config::ReconcileConfig;
use medcamp_core::{ReconciliationReport, reconcile, records};

use crate::report_fmt;

#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Export of every record in scope.
    #[arg(long)]
    pub all: PathBuf,

    /// Export produced by the confirmed-only query.
    #[arg(long)]
    pub confirmed: PathBuf,

    /// Exit with status 2 when drift is found.
    #[arg(long)]
    pub fail_on_drift: bool,

    /// Emit the report as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Build the report and print it. Returns the report so the caller can
/// decide on an exit status.
pub fn run(
    args: &ReconcileArgs,
    config: &ReconcileConfig,
    now: DateTime<Utc>,
    out: &mut impl Write,
) -> anyhow::Result<ReconciliationReport> {
    let all = records::load_snapshot(&args.all)
        .with_context(|| format!("Failed to load records from {}", args.all.display()))?;
    let confirmed = records::load_snapshot(&args.confirmed).with_context(|| {
        format!(
            "Failed to load confirmed records from {}",
            args.confirmed.display()
        )
    })?;

    let report = reconcile(&all, &confirmed, now);

    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        report_fmt::write_report(out, &report, config.max_listed_ids)?;
    }
    Ok(report)
}

/// Whether this run should fail the process.
pub fn should_fail(
    args: &ReconcileArgs,
    config: &ReconcileConfig,
    report: &ReconciliationReport,
) -> bool {
    (args.fail_on_drift || config.fail_on_drift) && report.has_drift()
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
        args: ReconcileArgs,
    }

    const ALL: &str = r#"[
        {"id":"r1","studentId":"s1","sentAt":"2024-05-01T08:00:00Z","decision":"CONFIRMED"},
        {"id":"r2","studentId":"s2","sentAt":"2024-05-01T08:00:00Z","decision":"CONFIRMED"},
        {"id":"r3","studentId":"s3","sentAt":"2024-05-01T08:00:00Z","decision":"DECLINED"}
    ]"#;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 20, 0, 0).unwrap()
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        cli: TestCli,
    }

    fn fixture(confirmed: &str, extra: &[&str]) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let all_path = dir.path().join("all.json");
        let confirmed_path = dir.path().join("confirmed.ndjson");
        std::fs::write(&all_path, ALL).unwrap();
        std::fs::write(&confirmed_path, confirmed).unwrap();

        let mut argv = vec![
            "test".to_string(),
            "--all".to_string(),
            all_path.display().to_string(),
            "--confirmed".to_string(),
            confirmed_path.display().to_string(),
        ];
        argv.extend(extra.iter().map(ToString::to_string));
        Fixture {
            _dir: dir,
            cli: TestCli::parse_from(argv),
        }
    }

    fn run_fixture(f: &Fixture, config: &ReconcileConfig) -> (ReconciliationReport, String) {
        let mut buf = Vec::new();
        let report = run(&f.cli.args, config, now(), &mut buf).unwrap();
        (report, String::from_utf8(buf).unwrap())
    }

    #[test]
    fn parse_requires_both_files() {
        assert!(TestCli::try_parse_from(["test", "--all", "a.json"]).is_err());
        let cli = TestCli::parse_from(["test", "--all", "a", "--confirmed", "c", "--json"]);
        assert!(cli.args.json);
        assert!(!cli.args.fail_on_drift);
    }

    #[test]
    fn consistent_exports_pass() {
        let f = fixture(
            "{\"id\":\"r1\",\"decision\":\"CONFIRMED\",\"sentAt\":\"2024-05-01T08:00:00Z\"}\n\
             {\"id\":\"r2\",\"decision\":\"CONFIRMED\",\"sentAt\":\"2024-05-01T08:00:00Z\"}\n",
            &[],
        );
        let config = ReconcileConfig::default();
        let (report, out) = run_fixture(&f, &config);

        assert!(!report.has_drift());
        assert!(out.contains("consistent"));
        assert!(!should_fail(&f.cli.args, &config, &report));
    }

    #[test]
    fn drift_is_listed_and_can_fail() {
        let f = fixture(
            "{\"id\":\"r1\",\"decision\":\"CONFIRMED\",\"sentAt\":\"2024-05-01T08:00:00Z\"}\n",
            &["--fail-on-drift"],
        );
        let config = ReconcileConfig::default();
        let (report, out) = run_fixture(&f, &config);

        assert_eq!(report.missing_from_query, vec!["r2"]);
        assert!(out.contains("Missing from query (1):"));
        assert!(out.contains("DRIFT"));
        assert!(should_fail(&f.cli.args, &config, &report));
    }

    #[test]
    fn config_can_require_failure() {
        let f = fixture("", &[]);
        let config = ReconcileConfig {
            fail_on_drift: true,
            ..ReconcileConfig::default()
        };
        let (report, _) = run_fixture(&f, &config);
        assert!(should_fail(&f.cli.args, &config, &report));
    }

    #[test]
    fn json_report_is_machine_readable() {
        let f = fixture("", &["--json"]);
        let (_, out) = run_fixture(&f, &ReconcileConfig::default());
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["confirmedByStatus"], 2);
        assert_eq!(v["confirmedByQuery"], 0);
        assert_eq!(v["consistent"], false);
    }
}
