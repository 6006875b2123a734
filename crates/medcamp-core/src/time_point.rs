//! Timestamp normalisation.
//!
//! Records reach us with timestamps in one of two shapes: a string (RFC 3339,
//! ISO 8601 without offset, RFC 2822, or a US locale rendering such as
//! `5/1/2024, 10:00:00 AM`) or a positional tuple
//! `[year, month, day, hour, minute, second?]` whose month is 1-indexed.
//! Everything funnels through [`normalize`], which never fails: input it
//! cannot read becomes [`TimePoint::Unknown`] so that one bad record cannot
//! abort a batch. Offset-less forms are read as UTC.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, SecondsFormat, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::debug;

/// How an unknown instant is displayed and serialised. Reads back as unknown.
pub const UNKNOWN_LABEL: &str = "unknown";

/// Fewest tuple elements accepted: year, month, day, hour, minute.
pub const MIN_TUPLE_LEN: usize = 5;

/// Date-time layouts without an offset, tried in order.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y, %I:%M:%S %p",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y, %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

/// Date-only layouts; the instant is midnight UTC.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// A timestamp as it appears on the wire, before normalisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    /// Any string form.
    Text(String),
    /// Positional `[year, month(1-12), day, hour, minute, second?]`.
    Parts(Vec<i64>),
    /// Anything else (numbers, objects, mixed arrays). Always unknown.
    Other(Value),
}

impl From<&str> for RawTimestamp {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<Vec<i64>> for RawTimestamp {
    fn from(parts: Vec<i64>) -> Self {
        Self::Parts(parts)
    }
}

/// Why a raw timestamp could not be read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty timestamp")]
    Empty,

    #[error("unrecognised timestamp format: {0:?}")]
    Unrecognised(String),

    #[error("timestamp tuple has {0} elements, need at least {MIN_TUPLE_LEN}")]
    TooFewParts(usize),

    #[error("timestamp tuple {0:?} is not a real calendar instant")]
    OutOfRange(Vec<i64>),

    #[error("unsupported timestamp shape")]
    UnsupportedShape,
}

/// Canonical instant used by every deadline and status computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimePoint {
    Known(DateTime<Utc>),
    #[default]
    Unknown,
}

/// Calendar components of a known instant, month 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateParts {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl TimePoint {
    /// The instant, if known.
    pub const fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Known(at) => Some(*at),
            Self::Unknown => None,
        }
    }

    pub const fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }

    /// Re-derive the calendar components, the inverse of tuple normalisation.
    pub fn parts(&self) -> Option<DateParts> {
        let at = self.instant()?;
        Some(DateParts {
            year: at.year(),
            month: at.month(),
            day: at.day(),
            hour: at.hour(),
            minute: at.minute(),
            second: at.second(),
        })
    }
}

impl From<DateTime<Utc>> for TimePoint {
    fn from(at: DateTime<Utc>) -> Self {
        Self::Known(at)
    }
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(at) => f.write_str(&at.to_rfc3339_opts(SecondsFormat::Secs, true)),
            Self::Unknown => f.write_str(UNKNOWN_LABEL),
        }
    }
}

impl Serialize for TimePoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Known(at) => {
                serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
            // Not `null`: an `Option<TimePoint>` would read that back as absent.
            Self::Unknown => serializer.serialize_str(UNKNOWN_LABEL),
        }
    }
}

impl<'de> Deserialize<'de> for TimePoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawTimestamp::deserialize(deserializer).map(|raw| normalize(&raw))
    }
}

/// Normalise a raw timestamp. Unreadable input yields [`TimePoint::Unknown`].
pub fn normalize(raw: &RawTimestamp) -> TimePoint {
    match try_normalize(raw) {
        Ok(at) => TimePoint::Known(at),
        Err(e) => {
            debug!(error = %e, "Unreadable timestamp treated as unknown");
            TimePoint::Unknown
        }
    }
}

/// Normalise a string timestamp.
pub fn normalize_str(s: &str) -> TimePoint {
    normalize(&RawTimestamp::from(s))
}

/// Normalise a JSON value without first deserialising it into [`RawTimestamp`].
pub fn normalize_value(value: &Value) -> TimePoint {
    let raw = match value {
        Value::String(s) => RawTimestamp::Text(s.clone()),
        Value::Array(items) => match items.iter().map(Value::as_i64).collect::<Option<Vec<_>>>() {
            Some(parts) => RawTimestamp::Parts(parts),
            None => RawTimestamp::Other(value.clone()),
        },
        other => RawTimestamp::Other(other.clone()),
    };
    normalize(&raw)
}

/// Strict variant of [`normalize`] for callers that want the reason, such as
/// command-line flags where silently falling back to "unknown" would hide a typo.
pub fn try_normalize(raw: &RawTimestamp) -> Result<DateTime<Utc>, ParseError> {
    match raw {
        RawTimestamp::Text(s) => parse_text(s),
        RawTimestamp::Parts(parts) => from_parts(parts),
        RawTimestamp::Other(_) => Err(ParseError::UnsupportedShape),
    }
}

fn parse_text(s: &str) -> Result<DateTime<Utc>, ParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ParseError::Empty);
    }

    if let Ok(at) = DateTime::parse_from_rfc3339(s) {
        return Ok(at.with_timezone(&Utc));
    }
    if let Ok(at) = DateTime::parse_from_rfc2822(s) {
        return Ok(at.with_timezone(&Utc));
    }
    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Ok(naive.and_utc());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ParseError::Unrecognised(s.to_string()))
}

fn from_parts(parts: &[i64]) -> Result<DateTime<Utc>, ParseError> {
    if parts.len() < MIN_TUPLE_LEN {
        return Err(ParseError::TooFewParts(parts.len()));
    }
    let out_of_range = || ParseError::OutOfRange(parts.to_vec());
    let field = |i: usize| parts.get(i).copied().unwrap_or(0);
    let small = |i: usize| u32::try_from(field(i)).map_err(|_| out_of_range());

    let year = i32::try_from(field(0)).map_err(|_| out_of_range())?;
    // The tuple month is 1-indexed; chrono's month0 setter takes the 0-indexed form.
    let month0 = small(1)?.checked_sub(1).ok_or_else(out_of_range)?;
    let date = NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|d| d.with_month0(month0))
        .and_then(|d| d.with_day(small(2).ok()?))
        .ok_or_else(out_of_range)?;

    date.and_hms_opt(small(3)?, small(4)?, small(5)?)
        .map(|naive| naive.and_utc())
        .ok_or_else(out_of_range)
}

#[cfg(test)]
#[path = "time_point_tests.rs"]
mod tests;
