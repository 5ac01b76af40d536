//! Timestamp normalization
//!
//! Documents carry instants in several shapes depending on which client
//! wrote them:
//!
//! | Shape | Example |
//! |-------|---------|
//! | store-native object | `{"seconds": 1700000000, "nanoseconds": 5000000}` |
//! | admin-SDK object | `{"_seconds": 1700000000, "_nanoseconds": 0}` |
//! | epoch-seconds object | `{"seconds": 1700000000}` |
//! | ISO-8601 string | `"2023-11-14T22:13:20Z"` |
//! | epoch millis number | `1700000000000` |
//!
//! All of them go through [`normalize`] before any arithmetic. Writes always
//! use RFC-3339.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Placeholder rendered when an instant is missing or unreadable
pub const UNKNOWN: &str = "unknown";

/// Normalized instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Build from epoch milliseconds; `None` when out of range
    pub fn from_millis(millis: i64) -> Option<Self> {
        Utc.timestamp_millis_opt(millis).single().map(Self)
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    pub fn timestamp_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Whole minutes from `self` to `later` (negative if `later` is earlier)
    pub fn minutes_until(&self, later: &Timestamp) -> i64 {
        (later.0 - self.0).num_minutes()
    }

    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        normalize(&raw)
            .map(Timestamp)
            .ok_or_else(|| serde::de::Error::custom(format!("unrecognised timestamp: {}", raw)))
    }
}

/// Convert any supported timestamp shape into a UTC instant
///
/// Returns `None` for `null`, empty strings and anything unrecognised.
pub fn normalize(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_iso(s),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        Value::Object(map) => {
            let seconds = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanos = map
                .get("nanoseconds")
                .or_else(|| map.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            let nanos = u32::try_from(nanos).ok().filter(|n| *n < 1_000_000_000)?;
            Utc.timestamp_opt(seconds, nanos).single()
        }
        _ => None,
    }
}

fn parse_iso(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Offset-less ISO strings are taken as UTC
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Render an optional instant, falling back to [`UNKNOWN`]
pub fn display_or_unknown(ts: Option<&Timestamp>) -> String {
    ts.map(Timestamp::to_rfc3339)
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Serde helpers for optional timestamp fields
///
/// Malformed values read as `None` instead of failing the whole record,
/// so one bad field never hides an order from the list.
pub mod lenient {
    use super::{Timestamp, normalize};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(ts: &Option<Timestamp>, s: S) -> Result<S::Ok, S::Error> {
        ts.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Timestamp>, D::Error> {
        let raw = Option::<Value>::deserialize(d)?;
        Ok(raw.as_ref().and_then(normalize).map(Timestamp::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_three_shapes_normalize_equal() {
        let native = json!({"seconds": 1_700_000_000, "nanoseconds": 0});
        let seconds_only = json!({"seconds": 1_700_000_000});
        let iso = json!("2023-11-14T22:13:20Z");

        let a = normalize(&native).unwrap();
        let b = normalize(&seconds_only).unwrap();
        let c = normalize(&iso).unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_admin_sdk_shape_and_millis() {
        let sdk = json!({"_seconds": 1_700_000_000, "_nanoseconds": 500_000_000});
        let millis = json!(1_700_000_000_500i64);
        assert_eq!(normalize(&sdk), normalize(&millis));
    }

    #[test]
    fn test_offsets_are_converted() {
        let plus_three = normalize(&json!("2023-11-15T01:13:20+03:00")).unwrap();
        let utc = normalize(&json!("2023-11-14T22:13:20Z")).unwrap();
        assert_eq!(plus_three, utc);
    }

    #[test]
    fn test_naive_iso_is_utc() {
        let naive = normalize(&json!("2023-11-14T22:13:20")).unwrap();
        let utc = normalize(&json!("2023-11-14T22:13:20Z")).unwrap();
        assert_eq!(naive, utc);
    }

    #[test]
    fn test_unrecognised_shapes() {
        assert!(normalize(&Value::Null).is_none());
        assert!(normalize(&json!("")).is_none());
        assert!(normalize(&json!("yesterday")).is_none());
        assert!(normalize(&json!({"nanoseconds": 3})).is_none());
        assert!(normalize(&json!(true)).is_none());
    }

    #[test]
    fn test_display_or_unknown() {
        assert_eq!(display_or_unknown(None), UNKNOWN);
        let ts = Timestamp::from_millis(0).unwrap();
        assert_eq!(display_or_unknown(Some(&ts)), "1970-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_serde_roundtrip_writes_rfc3339() {
        let ts: Timestamp = serde_json::from_value(json!({"seconds": 60})).unwrap();
        assert_eq!(serde_json::to_value(ts).unwrap(), json!("1970-01-01T00:01:00.000Z"));
    }

    #[test]
    fn test_minutes_until() {
        let a = Timestamp::from_millis(0).unwrap();
        let b = Timestamp::from_millis(5 * 60_000 + 59_000).unwrap();
        assert_eq!(a.minutes_until(&b), 5);
    }

    #[derive(Debug, Deserialize)]
    struct Holder {
        #[serde(default, with = "lenient")]
        at: Option<Timestamp>,
    }

    #[test]
    fn test_lenient_field() {
        let h: Holder = serde_json::from_value(json!({"at": "garbage"})).unwrap();
        assert!(h.at.is_none());
        let h: Holder = serde_json::from_value(json!({})).unwrap();
        assert!(h.at.is_none());
        let h: Holder = serde_json::from_value(json!({"at": {"seconds": 1}})).unwrap();
        assert_eq!(h.at.unwrap().timestamp_millis(), 1000);
    }
}
