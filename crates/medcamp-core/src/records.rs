//! Tolerant reader for consent-record exports.
//!
//! Operational tooling feeds the reconciliation engine from JSON dumps of the
//! storage layer. Those dumps come from more than one query path, so the
//! reader accepts a JSON array or NDJSON, camelCase or `snake_case` keys, a few
//! id aliases, and either timestamp shape. Unknown fields are ignored.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::consent::{ConsentRecord, Decision};
use crate::error::{Error, Result};
use crate::time_point::normalize_value;

const ID_KEYS: &[&str] = &["id", "recordId", "record_id", "formId", "form_id"];
const SUBJECT_KEYS: &[&str] = &["subjectId", "subject_id", "studentId", "student_id"];
const CAMPAIGN_KEYS: &[&str] = &["campaignId", "campaign_id"];
const SENT_KEYS: &[&str] = &["sentAt", "sent_at"];
const RESPONDED_KEYS: &[&str] = &["respondedAt", "responded_at"];
const DECISION_KEYS: &[&str] = &["decision", "consent", "response"];

/// Parse a single NDJSON line.
pub fn parse_line(line: &str) -> Result<ConsentRecord> {
    let raw: Value = serde_json::from_str(line)?;
    parse_value(&raw)
}

/// Parse one JSON object into a record.
pub fn parse_value(raw: &Value) -> Result<ConsentRecord> {
    if !raw.is_object() {
        return Err(parse_error("record is not a JSON object"));
    }

    let id = first(raw, ID_KEYS)
        .and_then(id_string)
        .ok_or_else(|| parse_error("missing record id"))?;
    let subject_id = first(raw, SUBJECT_KEYS)
        .and_then(id_string)
        .unwrap_or_default();
    let campaign_id = first(raw, CAMPAIGN_KEYS).and_then(id_string);

    let sent_at = first(raw, SENT_KEYS)
        .filter(|v| !v.is_null())
        .map(normalize_value);
    let responded_at = first(raw, RESPONDED_KEYS)
        .filter(|v| !v.is_null())
        .map(normalize_value);
    let decision = first(raw, DECISION_KEYS).and_then(parse_decision);

    Ok(ConsentRecord {
        id,
        subject_id,
        campaign_id,
        sent_at,
        responded_at,
        decision,
    })
}

/// Parse a whole export: either one JSON array, or one object per line.
pub fn parse_snapshot(content: &str) -> Result<Vec<ConsentRecord>> {
    let trimmed = content.trim_start();
    if trimmed.starts_with('[') {
        let values: Vec<Value> = serde_json::from_str(trimmed)?;
        return values
            .iter()
            .enumerate()
            .map(|(i, v)| parse_value(v).map_err(|e| at_line(e, i + 1)))
            .collect();
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| parse_line(line).map_err(|e| at_line(e, i + 1)))
        .collect()
}

/// Read and parse an export file.
pub fn load_snapshot(path: &Path) -> Result<Vec<ConsentRecord>> {
    let content = std::fs::read_to_string(path)?;
    let records = parse_snapshot(&content)?;
    debug!(path = %path.display(), count = records.len(), "Loaded record snapshot");
    Ok(records)
}

fn first<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| raw.get(*key))
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_decision(value: &Value) -> Option<Decision> {
    match value {
        Value::Bool(true) => Some(Decision::Accept),
        Value::Bool(false) => Some(Decision::Reject),
        Value::String(s) => match s.trim().to_ascii_uppercase().as_str() {
            "CONFIRMED" | "CONFIRM" | "APPROVED" | "APPROVE" | "ACCEPTED" | "ACCEPT" => {
                Some(Decision::Accept)
            }
            "DECLINED" | "DECLINE" | "REJECTED" | "REJECT" => Some(Decision::Reject),
            _ => None,
        },
        _ => None,
    }
}

fn parse_error(reason: &str) -> Error {
    Error::RecordParse {
        line: 0,
        reason: reason.to_string(),
    }
}

fn at_line(err: Error, line: usize) -> Error {
    match err {
        Error::RecordParse { reason, .. } => Error::RecordParse { line, reason },
        Error::Json(e) => Error::RecordParse {
            line,
            reason: e.to_string(),
        },
        other => other,
    }
}
