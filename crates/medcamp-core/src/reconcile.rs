//! Status reconciliation.
//!
//! Two query paths report how many guardians confirmed a campaign: one
//! classifies every record with [`ConsentRecord::current_status`], the other
//! is a storage-side "confirmed only" projection. They are supposed to agree.
//! [`reconcile`] compares them and reports any drift. It never repairs it.

use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::consent::{ConsentRecord, ConsentStatus};
use crate::deadline::Clock;

/// Count of records per status. Every status is present, zero or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StatusCounts(BTreeMap<ConsentStatus, usize>);

impl Default for StatusCounts {
    fn default() -> Self {
        Self(ConsentStatus::ALL.into_iter().map(|s| (s, 0)).collect())
    }
}

impl StatusCounts {
    /// Classify each record as of `now` and count.
    pub fn tally<'a>(
        records: impl IntoIterator<Item = &'a ConsentRecord>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut counts = Self::default();
        for record in records {
            counts.add(record.current_status(now));
        }
        counts
    }

    pub fn add(&mut self, status: ConsentStatus) {
        *self.0.entry(status).or_default() += 1;
    }

    pub fn get(&self, status: ConsentStatus) -> usize {
        self.0.get(&status).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConsentStatus, usize)> + '_ {
        self.0.iter().map(|(status, count)| (*status, *count))
    }
}

/// Outcome of comparing the two derivations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub evaluated_at: DateTime<Utc>,
    /// Records classified by status derivation.
    pub total: usize,
    pub counts: StatusCounts,
    /// CONFIRMED count from status derivation.
    pub confirmed_by_status: usize,
    /// Size of the confirmed-only projection.
    pub confirmed_by_query: usize,
    /// The two confirmed counts agree.
    pub consistent: bool,
    /// Ids derived as CONFIRMED but absent from the projection.
    pub missing_from_query: Vec<String>,
    /// Ids in the projection that status derivation does not call CONFIRMED.
    pub unexpected_in_query: Vec<String>,
    /// Records carrying at least one unreadable timestamp.
    pub unknown_timestamps: usize,
}

impl ReconciliationReport {
    /// True when counts disagree or either side holds ids the other lacks.
    /// Equal counts can still hide a swapped record.
    pub fn has_drift(&self) -> bool {
        !self.consistent
            || !self.missing_from_query.is_empty()
            || !self.unexpected_in_query.is_empty()
    }

    /// One line for operators.
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{} records: {} confirmed by status, {} by confirmed query",
            self.total, self.confirmed_by_status, self.confirmed_by_query
        );
        if self.has_drift() {
            let _ = write!(
                line,
                "; DRIFT ({} missing from query, {} unexpected in query)",
                self.missing_from_query.len(),
                self.unexpected_in_query.len()
            );
        } else {
            line.push_str("; consistent");
        }
        if self.unknown_timestamps > 0 {
            let _ = write!(line, "; {} with unreadable timestamps", self.unknown_timestamps);
        }
        line
    }
}

/// Compare status-derived counts over `all_records` with the independently
/// fetched `confirmed_only` projection, as of `now`.
pub fn reconcile(
    all_records: &[ConsentRecord],
    confirmed_only: &[ConsentRecord],
    now: DateTime<Utc>,
) -> ReconciliationReport {
    let mut counts = StatusCounts::default();
    let mut confirmed_ids = HashSet::new();
    let mut derived_confirmed = Vec::new();
    let mut unknown_timestamps = 0;

    for record in all_records {
        let status = record.current_status(now);
        counts.add(status);
        if status == ConsentStatus::Confirmed {
            confirmed_ids.insert(record.id.as_str());
            derived_confirmed.push(record.id.as_str());
        }
        if record.has_unknown_timestamp() {
            unknown_timestamps += 1;
        }
    }

    let queried_ids: HashSet<&str> = confirmed_only.iter().map(|r| r.id.as_str()).collect();
    let missing_from_query: Vec<String> = derived_confirmed
        .iter()
        .filter(|id| !queried_ids.contains(*id))
        .map(|id| (*id).to_string())
        .collect();
    let unexpected_in_query: Vec<String> = confirmed_only
        .iter()
        .filter(|r| !confirmed_ids.contains(r.id.as_str()))
        .map(|r| r.id.clone())
        .collect();

    let confirmed_by_status = counts.get(ConsentStatus::Confirmed);
    let confirmed_by_query = confirmed_only.len();
    let report = ReconciliationReport {
        evaluated_at: now,
        total: counts.total(),
        counts,
        confirmed_by_status,
        confirmed_by_query,
        consistent: confirmed_by_status == confirmed_by_query,
        missing_from_query,
        unexpected_in_query,
        unknown_timestamps,
    };

    if report.has_drift() {
        warn!(
            total = report.total,
            confirmed_by_status,
            confirmed_by_query,
            missing = report.missing_from_query.len(),
            unexpected = report.unexpected_in_query.len(),
            "Status reconciliation drift detected"
        );
    } else {
        debug!(total = report.total, confirmed_by_status, "Status reconciliation consistent");
    }

    report
}

/// [`reconcile`] with `now` sampled once from `clock`.
pub fn reconcile_with_clock(
    all_records: &[ConsentRecord],
    confirmed_only: &[ConsentRecord],
    clock: &impl Clock,
) -> ReconciliationReport {
    reconcile(all_records, confirmed_only, clock.now())
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
