//! Campaign schedule lead-time validation.
//!
//! A campaign must be scheduled at least [`MIN_LEAD_DAYS`] whole days after it
//! is created. The check runs once, at creation; moving "now" forward never
//! invalidates a campaign that was accepted.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::time_point::TimePoint;

/// Minimum whole days between campaign creation and execution.
pub const MIN_LEAD_DAYS: i64 = 4;

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Schedule errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error(
        "Campaign must be scheduled at least {minimum_days} days after creation \
         (currently {days_difference} days)"
    )]
    TooSoon {
        days_difference: i64,
        minimum_days: i64,
    },

    #[error("Campaign creation or execution date could not be read")]
    UnknownDate,
}

/// Creation and execution instants of a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignScheduleFact {
    pub created_at: TimePoint,
    pub scheduled_at: TimePoint,
}

impl CampaignScheduleFact {
    pub fn validate(&self) -> ScheduleValidation {
        validate(&self.created_at, &self.scheduled_at)
    }

    pub fn check(&self) -> Result<i64, ScheduleError> {
        check(&self.created_at, &self.scheduled_at)
    }
}

/// Advisory outcome for the caller creating a campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleValidation {
    pub is_valid: bool,
    pub days_difference: i64,
    pub message: String,
}

/// Whole days from `from` to `to`, floored.
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_milliseconds().div_euclid(MS_PER_DAY)
}

/// Returns the day difference when the lead time is satisfied.
pub fn check(created_at: &TimePoint, scheduled_at: &TimePoint) -> Result<i64, ScheduleError> {
    let (Some(created), Some(scheduled)) = (created_at.instant(), scheduled_at.instant()) else {
        return Err(ScheduleError::UnknownDate);
    };
    let days_difference = days_between(created, scheduled);
    if days_difference >= MIN_LEAD_DAYS {
        Ok(days_difference)
    } else {
        Err(ScheduleError::TooSoon {
            days_difference,
            minimum_days: MIN_LEAD_DAYS,
        })
    }
}

/// Validate a proposed schedule without failing.
pub fn validate(created_at: &TimePoint, scheduled_at: &TimePoint) -> ScheduleValidation {
    match check(created_at, scheduled_at) {
        Ok(days_difference) => ScheduleValidation {
            is_valid: true,
            days_difference,
            message: format!("Campaign is scheduled {days_difference} days after creation"),
        },
        Err(err) => {
            debug!(%created_at, %scheduled_at, reason = %err, "Schedule rejected");
            let days_difference = match err {
                ScheduleError::TooSoon {
                    days_difference, ..
                } => days_difference,
                ScheduleError::UnknownDate => 0,
            };
            ScheduleValidation {
                is_valid: false,
                days_difference,
                message: err.to_string(),
            }
        }
    }
}

/// First instant a campaign created at `created_at` may be scheduled for.
/// `None` when that instant lies past the last representable date.
pub fn earliest_allowed(created_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
    created_at.checked_add_signed(Duration::days(MIN_LEAD_DAYS))
}

/// Date-picker guard: true when `candidate` falls before the earliest
/// allowed instant. Unreadable candidates are always disabled, and so is
/// every candidate when the earliest allowed instant is unrepresentable.
pub fn is_date_disabled(candidate: &TimePoint, created_at: DateTime<Utc>) -> bool {
    match (candidate.instant(), earliest_allowed(created_at)) {
        (Some(at), Some(earliest)) => at < earliest,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::time_point::RawTimestamp;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 20, 9, 30, 0).unwrap()
    }

    fn in_days(days: i64) -> TimePoint {
        TimePoint::Known(now() + Duration::days(days))
    }

    #[test]
    fn three_days_is_too_soon() {
        let result = validate(&TimePoint::Known(now()), &in_days(3));
        assert!(!result.is_valid);
        assert_eq!(result.days_difference, 3);
        assert!(result.message.contains("currently 3 days"));
    }

    #[test]
    fn four_days_is_valid() {
        let result = validate(&TimePoint::Known(now()), &in_days(4));
        assert!(result.is_valid);
        assert_eq!(result.days_difference, 4);
    }

    #[test]
    fn days_are_floored() {
        let almost_four = TimePoint::Known(now() + Duration::days(4) - Duration::minutes(1));
        let fact = CampaignScheduleFact {
            created_at: TimePoint::Known(now()),
            scheduled_at: almost_four,
        };
        assert_eq!(
            fact.check(),
            Err(ScheduleError::TooSoon {
                days_difference: 3,
                minimum_days: MIN_LEAD_DAYS,
            })
        );
        let before = TimePoint::Known(now() - Duration::hours(1));
        assert_eq!(validate(&TimePoint::Known(now()), &before).days_difference, -1);
    }

    #[test]
    fn unknown_dates_are_invalid() {
        let result = validate(&TimePoint::Unknown, &in_days(10));
        assert!(!result.is_valid);
        assert_eq!(
            check(&TimePoint::Known(now()), &TimePoint::Unknown),
            Err(ScheduleError::UnknownDate)
        );
    }

    #[test]
    fn date_picker_disables_dates_inside_lead_time() {
        assert!(is_date_disabled(&in_days(1), now()));
        assert!(is_date_disabled(
            &TimePoint::Known(earliest_allowed(now()).unwrap() - Duration::seconds(1)),
            now()
        ));
        assert!(!is_date_disabled(
            &TimePoint::Known(earliest_allowed(now()).unwrap()),
            now()
        ));
        assert!(!is_date_disabled(&in_days(30), now()));
        assert!(is_date_disabled(&TimePoint::Unknown, now()));
    }

    #[test]
    fn far_future_creation_has_no_earliest_date() {
        let created = crate::time_point::normalize(&RawTimestamp::Parts(vec![262_142, 12, 30, 0, 0]));
        let created = created.instant().unwrap();

        assert_eq!(earliest_allowed(created), None);
        assert!(is_date_disabled(&TimePoint::Known(created), created));
        assert!(!validate(&TimePoint::Known(created), &TimePoint::Known(created)).is_valid);
    }

    #[test]
    fn validation_serializes_camel_case() {
        let json = serde_json::to_value(validate(&TimePoint::Known(now()), &in_days(5))).unwrap();
        assert_eq!(json["isValid"], true);
        assert_eq!(json["daysDifference"], 5);
    }
}
