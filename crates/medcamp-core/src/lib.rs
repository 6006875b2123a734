//! `MedCamp` Core Library
//!
//! Time-windowed consent and approval workflow for school medical campaigns:
//! - Timestamp normalisation across string and tuple encodings
//! - Deadline evaluation with an injectable clock
//! - Consent and manager-approval state machines
//! - Campaign schedule lead-time validation
//! - Reconciliation of status counts between two query paths
//!
//! Everything here is pure and synchronous. Persistence and notification
//! delivery belong to the caller.

pub mod config;
pub mod consent;
pub mod deadline;
pub mod error;
pub mod reconcile;
pub mod records;
pub mod schedule;
pub mod time_point;
pub mod tracing_init;

pub use config::Config;
pub use consent::{
    CampaignApproval, CampaignStatus, ConsentRecord, ConsentStatus, Decision, TransitionError,
};
pub use deadline::{Clock, DeadlineWindow, FixedClock, SystemClock, WorkflowKind};
pub use error::{Error, Result};
pub use reconcile::{ReconciliationReport, StatusCounts, reconcile};
pub use schedule::{CampaignScheduleFact, ScheduleError, ScheduleValidation};
pub use time_point::{RawTimestamp, TimePoint, normalize};
