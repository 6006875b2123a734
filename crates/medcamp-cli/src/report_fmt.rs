//! Text formatting helpers for CLI reports.

use std::io::{self, Write};

use medcamp_core::ReconciliationReport;
use medcamp_core::deadline::{self, ActionWindow};
use medcamp_core::reconcile::StatusCounts;
use medcamp_core::schedule::ScheduleValidation;

/// Write one aligned line per status, followed by the total.
pub fn write_counts(w: &mut impl Write, counts: &StatusCounts) -> io::Result<()> {
    for (status, count) in counts.iter() {
        writeln!(w, "  {:<18} {count:>6}", status.as_str())?;
    }
    writeln!(w, "  {:<18} {:>6}", "TOTAL", counts.total())
}

/// Write a labelled id list, listing at most `max` ids.
pub fn write_id_list(
    w: &mut impl Write,
    label: &str,
    ids: &[String],
    max: usize,
) -> io::Result<()> {
    if ids.is_empty() {
        return Ok(());
    }
    writeln!(w, "  {label} ({}):", ids.len())?;
    for id in ids.iter().take(max) {
        writeln!(w, "    {id}")?;
    }
    if ids.len() > max {
        writeln!(w, "    ... and {} more", ids.len() - max)?;
    }
    Ok(())
}

pub fn write_report(
    w: &mut impl Write,
    report: &ReconciliationReport,
    max_ids: usize,
) -> io::Result<()> {
    writeln!(w, "Evaluated at: {}", report.evaluated_at.to_rfc3339())?;
    write_counts(w, &report.counts)?;
    writeln!(w)?;
    writeln!(w, "  Confirmed by status: {}", report.confirmed_by_status)?;
    writeln!(w, "  Confirmed by query:  {}", report.confirmed_by_query)?;
    write_id_list(w, "Missing from query", &report.missing_from_query, max_ids)?;
    write_id_list(w, "Unexpected in query", &report.unexpected_in_query, max_ids)?;
    writeln!(w)?;
    writeln!(w, "{}", report.summary())
}

pub fn write_window(w: &mut impl Write, window: &ActionWindow) -> io::Result<()> {
    writeln!(w, "  Workflow:   {} ({}h)", window.kind, window.kind.window_hours())?;
    writeln!(w, "  Elapsed:    {}h", window.elapsed_hours)?;
    writeln!(
        w,
        "  Remaining:  {}",
        deadline::format_time_remaining(window.remaining_hours)
    )?;
    writeln!(w, "  Can act:    {}", if window.can_act { "yes" } else { "no" })?;
    writeln!(w, "{}", window.message)
}

pub fn write_schedule(w: &mut impl Write, validation: &ScheduleValidation) -> io::Result<()> {
    let verdict = if validation.is_valid { "OK" } else { "REJECTED" };
    writeln!(w, "{verdict}: {}", validation.message)
}
