//! Consent and approval state machines.
//!
//! A consent record moves `PENDING_SEND -> AWAITING_RESPONSE` when the form
//! is dispatched, then to `CONFIRMED` or `DECLINED` on the guardian's answer.
//! `EXPIRED` is never written: [`ConsentRecord::current_status`] synthesises
//! it from "sent, unanswered, window elapsed" on every read, so a stored
//! record is never stale and no background job is needed.
//!
//! A campaign's manager approval runs the same machine with a 24-hour window
//! opened at creation, ending in `ACTIVE`, `REJECTED` or `EXPIRED`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::deadline::{self, DeadlineWindow, WorkflowKind};
use crate::time_point::TimePoint;

/// An explicit answer from a guardian or manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accept,
    Reject,
}

/// Observed status of a consent record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsentStatus {
    PendingSend,
    AwaitingResponse,
    Confirmed,
    Declined,
    Expired,
}

impl ConsentStatus {
    pub const ALL: [Self; 5] = [
        Self::PendingSend,
        Self::AwaitingResponse,
        Self::Confirmed,
        Self::Declined,
        Self::Expired,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingSend => "PENDING_SEND",
            Self::AwaitingResponse => "AWAITING_RESPONSE",
            Self::Confirmed => "CONFIRMED",
            Self::Declined => "DECLINED",
            Self::Expired => "EXPIRED",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::Declined | Self::Expired)
    }
}

impl fmt::Display for ConsentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a status label is not one of [`ConsentStatus::ALL`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown consent status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for ConsentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Observed status of a campaign's manager approval.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignStatus {
    PendingApproval,
    Active,
    Rejected,
    Expired,
}

impl CampaignStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingApproval => "PENDING_APPROVAL",
            Self::Active => "ACTIVE",
            Self::Rejected => "REJECTED",
            Self::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transition the machine refused. The record is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("{record_id} has already been sent")]
    AlreadyDispatched { record_id: String },

    #[error("{record_id} has not been sent yet")]
    NotDispatched { record_id: String },

    #[error("{record_id} is already {status}")]
    AlreadyResolved {
        record_id: String,
        status: &'static str,
    },

    #[error(
        "{record_id}: the {window_hours}-hour window closed ({elapsed_hours}h elapsed)"
    )]
    WindowExpired {
        record_id: String,
        elapsed_hours: i64,
        window_hours: u32,
    },
}

/// Lifecycle position shared by both machines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    NotOpened,
    Open,
    Decided(Decision),
    Lapsed,
}

/// The single derivation both machines go through. A stored decision wins
/// over the clock, so an answer recorded late by another system still reads
/// as that answer.
fn derive_phase(
    opened_at: Option<&TimePoint>,
    decision: Option<Decision>,
    kind: WorkflowKind,
    now: DateTime<Utc>,
) -> Phase {
    match (opened_at, decision) {
        (_, Some(decision)) => Phase::Decided(decision),
        (None, None) => Phase::NotOpened,
        (Some(at), None) if deadline::is_expired(at, kind.window_hours(), now) => Phase::Lapsed,
        (Some(_), None) => Phase::Open,
    }
}

/// Check that a decision may be recorded at `at`.
fn check_decidable(
    record_id: &str,
    opened_at: Option<&TimePoint>,
    phase: Phase,
    status: &'static str,
    kind: WorkflowKind,
    at: DateTime<Utc>,
) -> Result<(), TransitionError> {
    let err = match phase {
        Phase::Open => return Ok(()),
        Phase::NotOpened => TransitionError::NotDispatched {
            record_id: record_id.to_string(),
        },
        Phase::Decided(_) => TransitionError::AlreadyResolved {
            record_id: record_id.to_string(),
            status,
        },
        Phase::Lapsed => TransitionError::WindowExpired {
            record_id: record_id.to_string(),
            elapsed_hours: opened_at.map_or(0, |start| deadline::elapsed_hours(start, at)),
            window_hours: kind.window_hours(),
        },
    };
    warn!(record_id, workflow = %kind, reason = %err, "Transition rejected");
    Err(err)
}

/// One subject's participation in one campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentRecord {
    pub id: String,
    pub subject_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
    /// When the form entered `AWAITING_RESPONSE`.
    #[serde(default)]
    pub sent_at: Option<TimePoint>,
    #[serde(default)]
    pub responded_at: Option<TimePoint>,
    #[serde(default)]
    pub decision: Option<Decision>,
}

impl ConsentRecord {
    /// A freshly created, unsent record.
    pub fn new(id: impl Into<String>, subject_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            subject_id: subject_id.into(),
            campaign_id: None,
            sent_at: None,
            responded_at: None,
            decision: None,
        }
    }

    #[must_use]
    pub fn with_campaign(mut self, campaign_id: impl Into<String>) -> Self {
        self.campaign_id = Some(campaign_id.into());
        self
    }

    /// The response window, once the form has been sent.
    pub fn window(&self) -> Option<DeadlineWindow> {
        self.sent_at
            .map(|sent| DeadlineWindow::for_kind(sent, WorkflowKind::ParentResponse))
    }

    /// Status as of `now`. Pure: same record and same `now`, same answer.
    pub fn current_status(&self, now: DateTime<Utc>) -> ConsentStatus {
        match self.phase(now) {
            Phase::NotOpened => ConsentStatus::PendingSend,
            Phase::Open => ConsentStatus::AwaitingResponse,
            Phase::Decided(Decision::Accept) => ConsentStatus::Confirmed,
            Phase::Decided(Decision::Reject) => ConsentStatus::Declined,
            Phase::Lapsed => ConsentStatus::Expired,
        }
    }

    /// Whether any stored timestamp failed to normalise.
    pub fn has_unknown_timestamp(&self) -> bool {
        [self.sent_at, self.responded_at]
            .iter()
            .flatten()
            .any(|point| !point.is_known())
    }

    /// `PENDING_SEND -> AWAITING_RESPONSE`, when the notification goes out.
    pub fn dispatch(&mut self, at: DateTime<Utc>) -> Result<ConsentStatus, TransitionError> {
        if self.decision.is_some() {
            let status = self.current_status(at).as_str();
            warn!(record_id = %self.id, status, "Dispatch rejected");
            return Err(TransitionError::AlreadyResolved {
                record_id: self.id.clone(),
                status,
            });
        }
        if self.sent_at.is_some() {
            warn!(record_id = %self.id, "Dispatch rejected, already sent");
            return Err(TransitionError::AlreadyDispatched {
                record_id: self.id.clone(),
            });
        }

        self.sent_at = Some(TimePoint::Known(at));
        info!(record_id = %self.id, subject_id = %self.subject_id, "Consent form sent");
        Ok(ConsentStatus::AwaitingResponse)
    }

    /// `AWAITING_RESPONSE -> CONFIRMED | DECLINED`, legal only inside the window.
    pub fn respond(
        &mut self,
        decision: Decision,
        at: DateTime<Utc>,
    ) -> Result<ConsentStatus, TransitionError> {
        let phase = self.phase(at);
        check_decidable(
            &self.id,
            self.sent_at.as_ref(),
            phase,
            self.current_status(at).as_str(),
            WorkflowKind::ParentResponse,
            at,
        )?;

        self.decision = Some(decision);
        self.responded_at = Some(TimePoint::Known(at));
        let status = self.current_status(at);
        info!(record_id = %self.id, %status, "Consent response recorded");
        Ok(status)
    }

    fn phase(&self, now: DateTime<Utc>) -> Phase {
        derive_phase(
            self.sent_at.as_ref(),
            self.decision,
            WorkflowKind::ParentResponse,
            now,
        )
    }
}

/// A campaign's manager-approval record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignApproval {
    pub campaign_id: String,
    /// Creation opens the approval window.
    pub created_at: TimePoint,
    #[serde(default)]
    pub decided_at: Option<TimePoint>,
    #[serde(default)]
    pub decision: Option<Decision>,
}

impl CampaignApproval {
    pub fn new(campaign_id: impl Into<String>, created_at: TimePoint) -> Self {
        Self {
            campaign_id: campaign_id.into(),
            created_at,
            decided_at: None,
            decision: None,
        }
    }

    pub const fn window(&self) -> DeadlineWindow {
        DeadlineWindow::for_kind(self.created_at, WorkflowKind::ManagerApproval)
    }

    /// Status as of `now`; `EXPIRED` means the campaign lapsed undecided.
    pub fn current_status(&self, now: DateTime<Utc>) -> CampaignStatus {
        match self.phase(now) {
            Phase::NotOpened | Phase::Open => CampaignStatus::PendingApproval,
            Phase::Decided(Decision::Accept) => CampaignStatus::Active,
            Phase::Decided(Decision::Reject) => CampaignStatus::Rejected,
            Phase::Lapsed => CampaignStatus::Expired,
        }
    }

    /// `PENDING_APPROVAL -> ACTIVE | REJECTED`, legal only inside the window.
    pub fn decide(
        &mut self,
        decision: Decision,
        at: DateTime<Utc>,
    ) -> Result<CampaignStatus, TransitionError> {
        check_decidable(
            &self.campaign_id,
            Some(&self.created_at),
            self.phase(at),
            self.current_status(at).as_str(),
            WorkflowKind::ManagerApproval,
            at,
        )?;

        self.decision = Some(decision);
        self.decided_at = Some(TimePoint::Known(at));
        let status = self.current_status(at);
        info!(campaign_id = %self.campaign_id, %status, "Campaign decision recorded");
        Ok(status)
    }

    fn phase(&self, now: DateTime<Utc>) -> Phase {
        derive_phase(
            Some(&self.created_at),
            self.decision,
            WorkflowKind::ManagerApproval,
            now,
        )
    }
}

#[cfg(test)]
#[path = "consent_tests.rs"]
mod tests;
