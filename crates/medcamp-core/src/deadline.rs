//! Deadline arithmetic for time-windowed actions.
//!
//! Every evaluation takes `now` explicitly. Production callers sample it once
//! from [`SystemClock`]; tests and snapshot replays pass a [`FixedClock`].
//! Hours are whole hours truncated toward zero from the millisecond
//! difference, so a window never flaps around an hour boundary.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::time_point::TimePoint;

/// Hours a manager has to approve or reject a newly created campaign.
pub const MANAGER_APPROVAL_WINDOW_HOURS: u32 = 24;

/// Hours a guardian has to answer a consent form once it has been sent.
pub const PARENT_RESPONSE_WINDOW_HOURS: u32 = 48;

/// Label shown instead of a remaining duration once a window has closed.
pub const EXPIRED_LABEL: &str = "Expired";

const MS_PER_HOUR: i64 = 60 * 60 * 1000;

/// Source of "now".
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// The two time-windowed workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowKind {
    /// Manager decision on a newly created campaign.
    ManagerApproval,
    /// Guardian answer to a consent form.
    ParentResponse,
}

impl WorkflowKind {
    pub const fn window_hours(self) -> u32 {
        match self {
            Self::ManagerApproval => MANAGER_APPROVAL_WINDOW_HOURS,
            Self::ParentResponse => PARENT_RESPONSE_WINDOW_HOURS,
        }
    }

    /// What the actor is expected to do inside the window.
    pub const fn action(self) -> &'static str {
        match self {
            Self::ManagerApproval => "approve or reject the campaign",
            Self::ParentResponse => "respond to the consent form",
        }
    }
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ManagerApproval => "manager approval",
            Self::ParentResponse => "parent response",
        })
    }
}

/// Whole hours from `start` to `now`. An unknown start counts as zero elapsed.
pub fn elapsed_hours(start: &TimePoint, now: DateTime<Utc>) -> i64 {
    start
        .instant()
        .map_or(0, |at| (now - at).num_milliseconds() / MS_PER_HOUR)
}

/// Hours left in the window; negative once overdue.
pub fn remaining_hours(start: &TimePoint, duration_hours: u32, now: DateTime<Utc>) -> i64 {
    i64::from(duration_hours) - elapsed_hours(start, now)
}

/// True once strictly more than `duration_hours` whole hours have elapsed.
pub fn is_expired(start: &TimePoint, duration_hours: u32, now: DateTime<Utc>) -> bool {
    elapsed_hours(start, now) > i64::from(duration_hours)
}

/// A start instant plus a fixed duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineWindow {
    pub start: TimePoint,
    pub duration_hours: u32,
}

/// One evaluation of a [`DeadlineWindow`] against a single sample of now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadlineStatus {
    pub elapsed_hours: i64,
    pub remaining_hours: i64,
    pub is_expired: bool,
}

impl DeadlineWindow {
    pub const fn new(start: TimePoint, duration_hours: u32) -> Self {
        Self {
            start,
            duration_hours,
        }
    }

    pub const fn for_kind(start: TimePoint, kind: WorkflowKind) -> Self {
        Self::new(start, kind.window_hours())
    }

    /// The instant the window closes. `None` when the start is unknown or
    /// the close falls past the last representable date.
    pub fn closes_at(&self) -> Option<DateTime<Utc>> {
        self.start.instant().and_then(|at| {
            at.checked_add_signed(Duration::hours(i64::from(self.duration_hours)))
        })
    }

    pub fn evaluate(&self, now: DateTime<Utc>) -> DeadlineStatus {
        let elapsed = elapsed_hours(&self.start, now);
        let duration = i64::from(self.duration_hours);
        DeadlineStatus {
            elapsed_hours: elapsed,
            remaining_hours: duration - elapsed,
            is_expired: elapsed > duration,
        }
    }
}

/// Human-readable remaining time. Zero or negative hours render as
/// [`EXPIRED_LABEL`], never as a negative duration.
pub fn format_time_remaining(remaining_hours: i64) -> String {
    if remaining_hours <= 0 {
        return EXPIRED_LABEL.to_string();
    }
    match (remaining_hours / 24, remaining_hours % 24) {
        (0, hours) => format!("{hours}h left"),
        (days, 0) => format!("{days}d left"),
        (days, hours) => format!("{days}d {hours}h left"),
    }
}

/// Whether an actor may still act inside a workflow window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionWindow {
    pub kind: WorkflowKind,
    pub can_act: bool,
    pub is_expired: bool,
    pub elapsed_hours: i64,
    pub remaining_hours: i64,
    pub message: String,
}

/// Evaluate the window of `kind` opened at `start`.
pub fn validate_action(kind: WorkflowKind, start: &TimePoint, now: DateTime<Utc>) -> ActionWindow {
    let status = DeadlineWindow::for_kind(*start, kind).evaluate(now);
    let message = if status.is_expired {
        format!(
            "The {}-hour window to {} closed {}h ago",
            kind.window_hours(),
            kind.action(),
            -status.remaining_hours
        )
    } else {
        format!(
            "{} to {}",
            format_time_remaining(status.remaining_hours),
            kind.action()
        )
    };
    ActionWindow {
        kind,
        can_act: !status.is_expired,
        is_expired: status.is_expired,
        elapsed_hours: status.elapsed_hours,
        remaining_hours: status.remaining_hours,
        message,
    }
}

/// Can a guardian still answer a form sent at `sent_at`?
pub fn validate_parent_form_action(sent_at: &TimePoint, now: DateTime<Utc>) -> ActionWindow {
    validate_action(WorkflowKind::ParentResponse, sent_at, now)
}

/// Can a manager still decide on a campaign created at `created_at`?
pub fn validate_manager_campaign_action(
    created_at: &TimePoint,
    now: DateTime<Utc>,
) -> ActionWindow {
    validate_action(WorkflowKind::ManagerApproval, created_at, now)
}
