use chrono::TimeZone;
use proptest::prelude::*;

use super::*;

fn tuple(parts: &[i64]) -> RawTimestamp {
    RawTimestamp::Parts(parts.to_vec())
}

fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

#[test]
fn tuple_month_is_one_indexed() {
    let point = normalize(&tuple(&[2024, 5, 1, 10, 30]));
    assert_eq!(point, TimePoint::Known(utc(2024, 5, 1, 10, 30, 0)));
}

#[test]
fn tuple_seconds_are_optional() {
    let five = normalize(&tuple(&[2024, 1, 31, 23, 59]));
    let six = normalize(&tuple(&[2024, 1, 31, 23, 59, 0]));
    assert_eq!(five, six);
}

#[test]
fn tuple_elements_past_sixth_are_ignored() {
    let point = normalize(&tuple(&[2024, 2, 29, 8, 0, 15, 123_000_000]));
    assert_eq!(point, TimePoint::Known(utc(2024, 2, 29, 8, 0, 15)));
}

#[test]
fn short_tuple_is_unknown() {
    assert_eq!(normalize(&tuple(&[2024, 5, 1])), TimePoint::Unknown);
    assert_eq!(normalize(&tuple(&[2024, 5, 1, 9])), TimePoint::Unknown);
    assert_eq!(
        try_normalize(&tuple(&[2024, 5, 1])),
        Err(ParseError::TooFewParts(3))
    );
}

#[test]
fn impossible_tuple_is_unknown() {
    assert_eq!(normalize(&tuple(&[2024, 13, 1, 0, 0])), TimePoint::Unknown);
    assert_eq!(normalize(&tuple(&[2024, 0, 1, 0, 0])), TimePoint::Unknown);
    assert_eq!(normalize(&tuple(&[2023, 2, 29, 0, 0])), TimePoint::Unknown);
    assert_eq!(normalize(&tuple(&[2024, 5, 1, 24, 0])), TimePoint::Unknown);
    assert_eq!(normalize(&tuple(&[2024, 5, -1, 0, 0])), TimePoint::Unknown);
}

#[test]
fn parses_rfc3339_with_offset() {
    let point = normalize_str("2024-05-01T10:00:00+07:00");
    assert_eq!(point, TimePoint::Known(utc(2024, 5, 1, 3, 0, 0)));
}

#[test]
fn parses_iso_without_offset_as_utc() {
    assert_eq!(
        normalize_str("2024-05-01T10:00:00"),
        TimePoint::Known(utc(2024, 5, 1, 10, 0, 0))
    );
    assert_eq!(
        normalize_str("2024-05-01T10:00:00.250"),
        TimePoint::Known(utc(2024, 5, 1, 10, 0, 0) + chrono::Duration::milliseconds(250))
    );
    assert_eq!(
        normalize_str("2024-05-01 10:00"),
        TimePoint::Known(utc(2024, 5, 1, 10, 0, 0))
    );
}

#[test]
fn parses_date_only_as_midnight() {
    assert_eq!(
        normalize_str("2024-05-01"),
        TimePoint::Known(utc(2024, 5, 1, 0, 0, 0))
    );
}

#[test]
fn parses_us_locale_rendering() {
    assert_eq!(
        normalize_str("5/1/2024, 1:05:09 PM"),
        TimePoint::Known(utc(2024, 5, 1, 13, 5, 9))
    );
    assert_eq!(
        normalize_str("05/01/2024"),
        TimePoint::Known(utc(2024, 5, 1, 0, 0, 0))
    );
}

#[test]
fn parses_rfc2822() {
    assert_eq!(
        normalize_str("Wed, 01 May 2024 10:00:00 GMT"),
        TimePoint::Known(utc(2024, 5, 1, 10, 0, 0))
    );
}

#[test]
fn garbage_strings_are_unknown() {
    assert_eq!(normalize_str(""), TimePoint::Unknown);
    assert_eq!(normalize_str("   "), TimePoint::Unknown);
    assert_eq!(normalize_str("not a date"), TimePoint::Unknown);
    assert_eq!(normalize_str("2024-02-30"), TimePoint::Unknown);
}

#[test]
fn other_json_shapes_are_unknown() {
    assert_eq!(normalize_value(&serde_json::json!(1_714_557_600)), TimePoint::Unknown);
    assert_eq!(normalize_value(&serde_json::json!({"y": 2024})), TimePoint::Unknown);
    assert_eq!(normalize_value(&serde_json::json!(null)), TimePoint::Unknown);
    let mixed = serde_json::json!([2024, "5", 1, 0, 0]);
    assert_eq!(normalize_value(&mixed), TimePoint::Unknown);
}

#[test]
fn json_values_route_to_the_right_shape() {
    let from_array = normalize_value(&serde_json::json!([2024, 5, 1, 10, 0, 0]));
    let from_string = normalize_value(&serde_json::json!("2024-05-01T10:00:00Z"));
    assert_eq!(from_array, from_string);
    assert!(from_array.is_known());
}

#[test]
fn normalize_is_referentially_transparent() {
    let raw = RawTimestamp::from("2024-05-01T10:00:00Z");
    assert_eq!(normalize(&raw), normalize(&raw));
}

#[test]
fn deserialize_accepts_both_shapes() {
    let points: Vec<TimePoint> =
        serde_json::from_str(r#"["2024-05-01T10:00:00Z", [2024, 5, 1, 10, 0], 17, "junk"]"#)
            .unwrap();
    assert_eq!(points[0], points[1]);
    assert_eq!(points[2], TimePoint::Unknown);
    assert_eq!(points[3], TimePoint::Unknown);
}

#[test]
fn serializes_known_as_rfc3339_and_unknown_as_label() {
    let points = [TimePoint::Known(utc(2024, 5, 1, 10, 0, 0)), TimePoint::Unknown];
    let json = serde_json::to_string(&points).unwrap();
    assert_eq!(json, r#"["2024-05-01T10:00:00Z","unknown"]"#);

    let back: Vec<Option<TimePoint>> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, vec![Some(points[0]), Some(TimePoint::Unknown)]);
}

#[test]
fn display() {
    let known = TimePoint::Known(utc(2024, 5, 1, 10, 0, 0));
    assert_eq!(known.to_string(), "2024-05-01T10:00:00Z");
    assert_eq!(TimePoint::Unknown.to_string(), "unknown");
}

proptest! {
    #[test]
    fn tuple_round_trips_through_parts(
        year in 1900i32..2200,
        month in 1u32..=12,
        day in 1u32..=28,
        hour in 0u32..24,
        minute in 0u32..60,
        second in 0u32..60,
    ) {
        let raw = RawTimestamp::Parts(vec![
            i64::from(year),
            i64::from(month),
            i64::from(day),
            i64::from(hour),
            i64::from(minute),
            i64::from(second),
        ]);
        let parts = normalize(&raw).parts().unwrap();
        prop_assert_eq!(parts, DateParts { year, month, day, hour, minute, second });
    }
}
