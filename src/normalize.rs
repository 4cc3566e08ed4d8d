//! Best-effort decoding of loosely-typed records.
//!
//! Records come from persistence and from LLM responses, so any field may be
//! missing, null, or of the wrong type. Nothing in this module returns an
//! error: every helper resolves to a typed value or a documented default.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

/// A raw key-value record before normalization.
pub type Record = Map<String, Value>;

/// The representations a date field can arrive in.
#[derive(Debug, Clone, PartialEq)]
pub enum DateValue {
    /// ISO-8601 text.
    Iso(String),
    /// An already-typed instant.
    Native(DateTime<Utc>),
    /// A timestamp object carrying whole seconds since the Unix epoch.
    EpochSeconds(i64),
}

impl DateValue {
    /// Sorts a raw value into one of the known date shapes.
    ///
    /// Strings are treated as ISO-8601; objects with a numeric `seconds`
    /// (or `_seconds`) member are timestamp objects. Everything else,
    /// including bare numbers, is unclassifiable.
    pub fn classify(value: &Value) -> Option<DateValue> {
        match value {
            Value::String(s) => Some(DateValue::Iso(s.clone())),
            Value::Object(obj) => ["seconds", "_seconds"]
                .iter()
                .filter_map(|key| obj.get(*key))
                .find_map(seconds_of)
                .map(DateValue::EpochSeconds),
            _ => None,
        }
    }

    /// Resolves to an instant, or `None` when the text does not parse or the
    /// seconds are out of range.
    pub fn resolve(&self) -> Option<DateTime<Utc>> {
        match self {
            DateValue::Native(dt) => Some(*dt),
            DateValue::Iso(s) => parse_iso(s),
            DateValue::EpochSeconds(secs) => {
                DateTime::<Utc>::from_timestamp_millis(secs.checked_mul(1000)?)
            }
        }
    }
}

impl From<DateTime<Utc>> for DateValue {
    fn from(dt: DateTime<Utc>) -> Self {
        DateValue::Native(dt)
    }
}

fn seconds_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        _ => None,
    }
}

/// Parses ISO-8601 text. Offsets are honoured; naive forms are read as UTC.
pub fn parse_iso(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc())
}

/// null → `""`, string → itself, anything else → its JSON rendering.
pub fn to_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Like [`to_string`], but null and empty strings become `None`.
pub fn to_optional_string(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        v => Some(to_string(v)).filter(|s| !s.is_empty()),
    }
}

/// null or non-list → `[]`; list → element-wise [`to_string`].
pub fn to_string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().map(|v| to_string(Some(v))).collect(),
        _ => Vec::new(),
    }
}

/// Native integer → itself; otherwise parse the string rendering; else `default`.
///
/// A JSON float such as `3.5` is not an integer and its rendering does not
/// parse, so it falls back to `default`.
pub fn to_int(value: Option<&Value>, default: i64) -> i64 {
    if let Some(n) = value.and_then(Value::as_i64) {
        return n;
    }
    to_string(value).trim().parse().unwrap_or(default)
}

/// Native number → itself; otherwise parse the string rendering; else `default`.
pub fn to_double(value: Option<&Value>, default: f64) -> f64 {
    if let Some(n) = value.and_then(Value::as_f64) {
        return n;
    }
    to_string(value)
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .unwrap_or(default)
}

/// Native boolean → itself; otherwise `true` only for the text "true"
/// (case-insensitive).
///
/// NOTE: `_default` is never consulted. A missing field, null, `"false"`,
/// `"1"` and any other non-"true" value all decode to `false`, even when the
/// caller passes `true`.
/// Stored data written against this rule depends on it, so do not "fix" it
/// without migrating those records.
pub fn to_bool(value: Option<&Value>, _default: bool) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        v => to_string(v).to_lowercase() == "true",
    }
}

/// Required date: any known representation, else `fallback`.
pub fn to_date(value: Option<&Value>, fallback: DateTime<Utc>) -> DateTime<Utc> {
    value
        .and_then(DateValue::classify)
        .and_then(|d| d.resolve())
        .unwrap_or(fallback)
}

/// Optional date: null → `None`, unparseable → `None`.
///
/// Kept separate from [`to_date`]: optional fields must never pick up a
/// "now" fallback.
pub fn to_optional_date(value: Option<&Value>) -> Option<DateTime<Utc>> {
    match value {
        None | Some(Value::Null) => None,
        Some(v) => DateValue::classify(v).and_then(|d| d.resolve()),
    }
}

/// Decodes a list with a per-element decoder, dropping elements it rejects.
///
/// null or non-list → `[]`. One bad element never fails the list.
pub fn decode_list<T, F>(value: Option<&Value>, decode: F) -> Vec<T>
where
    F: FnMut(&Value) -> Option<T>,
{
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(decode).collect(),
        _ => Vec::new(),
    }
}

/// Decodes a nested object field; non-objects decode as an empty record.
pub fn to_record(value: Option<&Value>) -> Record {
    match value {
        Some(Value::Object(obj)) => obj.clone(),
        _ => Record::new(),
    }
}

/// First present, non-null value among alternative spellings of a key.
pub fn pick<'a>(record: &'a Record, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find(|v| !v.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn to_string_rules() {
        assert_eq!(to_string(None), "");
        assert_eq!(to_string(Some(&Value::Null)), "");
        assert_eq!(to_string(Some(&json!("abc"))), "abc");
        assert_eq!(to_string(Some(&json!(42))), "42");
        assert_eq!(to_string(Some(&json!(1.5))), "1.5");
        assert_eq!(to_string(Some(&json!(true))), "true");
        assert_eq!(to_string(Some(&json!(["a", 1]))), "[\"a\",1]");
    }

    #[test]
    fn to_string_list_rules() {
        assert!(to_string_list(None).is_empty());
        assert!(to_string_list(Some(&json!("a,b"))).is_empty());
        assert!(to_string_list(Some(&json!({"a": 1}))).is_empty());
        assert_eq!(
            to_string_list(Some(&json!(["x", 2, null, false]))),
            vec!["x", "2", "", "false"]
        );
    }

    #[test]
    fn to_int_rules() {
        assert_eq!(to_int(None, 5), 5);
        assert_eq!(to_int(Some(&Value::Null), 5), 5);
        assert_eq!(to_int(Some(&json!(7)), 5), 7);
        assert_eq!(to_int(Some(&json!("42")), 0), 42);
        assert_eq!(to_int(Some(&json!(" -3 ")), 0), -3);
        assert_eq!(to_int(Some(&json!("abc")), 5), 5);
        assert_eq!(to_int(Some(&json!(3.5)), 5), 5);
        assert_eq!(to_int(Some(&json!([1])), 5), 5);
    }

    #[test]
    fn to_double_rules() {
        assert_eq!(to_double(Some(&json!(7.5)), 0.0), 7.5);
        assert_eq!(to_double(Some(&json!(7)), 0.0), 7.0);
        assert_eq!(to_double(Some(&json!("6.25")), 0.0), 6.25);
        assert_eq!(to_double(Some(&json!("NaN")), 1.0), 1.0);
        assert_eq!(to_double(None, 1.0), 1.0);
    }

    #[test]
    fn to_bool_rules() {
        assert!(to_bool(Some(&json!(true)), false));
        assert!(!to_bool(Some(&json!(false)), true));
        assert!(to_bool(Some(&json!("true")), false));
        assert!(to_bool(Some(&json!("True")), false));
        assert!(to_bool(Some(&json!("TRUE")), false));
        assert!(!to_bool(Some(&json!("false")), true));
        assert!(!to_bool(Some(&json!("1")), true));
        assert!(!to_bool(Some(&json!(1)), true));
        assert!(!to_bool(Some(&json!("yes")), true));
    }

    #[test]
    fn to_bool_ignores_default_for_missing_values() {
        // Asymmetric on purpose: a missing field is false even when the
        // caller asks for a true default.
        assert!(!to_bool(None, true));
        assert!(!to_bool(Some(&Value::Null), true));
    }

    #[test]
    fn date_from_iso_variants() {
        let expected = Utc.with_ymd_and_hms(2025, 6, 2, 8, 30, 0).unwrap();
        assert_eq!(to_date(Some(&json!("2025-06-02T08:30:00Z")), now()), expected);
        assert_eq!(to_date(Some(&json!("2025-06-02T10:30:00+02:00")), now()), expected);
        assert_eq!(to_date(Some(&json!("2025-06-02T08:30:00")), now()), expected);
        assert_eq!(to_date(Some(&json!("2025-06-02 08:30:00.000")), now()), expected);
        assert_eq!(
            to_date(Some(&json!("2025-06-02")), now()),
            Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn date_from_timestamp_object() {
        let ts = json!({"seconds": 1_700_000_000, "nanoseconds": 999_000_000});
        assert_eq!(
            to_date(Some(&ts), now()),
            Utc.timestamp_opt(1_700_000_000, 0).unwrap()
        );
        let underscored = json!({"_seconds": 1_700_000_000, "_nanoseconds": 0});
        assert_eq!(
            to_optional_date(Some(&underscored)),
            Some(Utc.timestamp_opt(1_700_000_000, 0).unwrap())
        );
    }

    #[test]
    fn native_date_passes_through() {
        let dt = Utc.with_ymd_and_hms(2024, 2, 29, 1, 2, 3).unwrap();
        assert_eq!(DateValue::from(dt).resolve(), Some(dt));
    }

    #[test]
    fn required_date_falls_back() {
        assert_eq!(to_date(None, now()), now());
        assert_eq!(to_date(Some(&json!("not a date")), now()), now());
        assert_eq!(to_date(Some(&json!(1_700_000_000)), now()), now());
        assert_eq!(to_date(Some(&json!({"secs": 1})), now()), now());
        assert_eq!(to_date(Some(&json!({"seconds": "1"})), now()), now());
        assert_eq!(to_date(Some(&json!({"seconds": i64::MAX})), now()), now());
    }

    #[test]
    fn optional_date_never_falls_back() {
        assert_eq!(to_optional_date(None), None);
        assert_eq!(to_optional_date(Some(&Value::Null)), None);
        assert_eq!(to_optional_date(Some(&json!("garbage"))), None);
        assert_eq!(to_optional_date(Some(&json!(false))), None);
    }

    #[test]
    fn decode_list_drops_rejected_elements() {
        let raw = json!([1, "two", 3, null]);
        let ints: Vec<i64> = decode_list(Some(&raw), Value::as_i64);
        assert_eq!(ints, vec![1, 3]);
        let none: Vec<i64> = decode_list(Some(&json!("x")), Value::as_i64);
        assert!(none.is_empty());
    }

    #[test]
    fn pick_skips_missing_and_null() {
        let record = to_record(Some(&json!({"phase_title": null, "phaseTitle": "A"})));
        assert_eq!(pick(&record, &["phase_title", "phaseTitle"]), Some(&json!("A")));
        assert_eq!(pick(&record, &["other"]), None);
    }
}
