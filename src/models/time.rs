//! Tolerant date and timestamp fields for API responses.
//!
//! Backends are inconsistent about dates: the same field may arrive as a
//! plain `YYYY-MM-DD`, a full RFC 3339 timestamp, a space-separated
//! timestamp, epoch milliseconds or `null`. These serde adapters accept all
//! of them and always serialize in one canonical form.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Raw wire representation
#[derive(Deserialize)]
#[serde(untagged)]
enum RawStamp {
    Text(String),
    Millis(i64),
}

/// Parse a timestamp string in any of the accepted shapes
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn from_raw(raw: RawStamp) -> Option<DateTime<Utc>> {
    match raw {
        RawStamp::Text(s) => parse_timestamp(&s),
        RawStamp::Millis(ms) => DateTime::from_timestamp_millis(ms),
    }
}

/// `Option<NaiveDate>` field adapter
pub mod date_opt {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<RawStamp>::deserialize(deserializer)?;
        Ok(raw.and_then(from_raw).map(|dt| dt.date_naive()))
    }
}

/// `Option<DateTime<Utc>>` field adapter
pub mod datetime_opt {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = Option::<RawStamp>::deserialize(deserializer)?;
        Ok(raw.and_then(from_raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Deserialize, Serialize)]
    struct Row {
        #[serde(default, with = "date_opt")]
        due: Option<NaiveDate>,
        #[serde(default, with = "datetime_opt")]
        at: Option<DateTime<Utc>>,
    }

    #[test]
    fn test_accepts_every_shape() {
        for due in [
            r#""2026-03-01""#,
            r#""2026-03-01T10:15:00Z""#,
            r#""2026-03-01T10:15:00.000+00:00""#,
            r#""2026-03-01 10:15:00""#,
        ] {
            let row: Row = serde_json::from_str(&format!(r#"{{"due": {due}}}"#)).unwrap();
            assert_eq!(row.due, NaiveDate::from_ymd_opt(2026, 3, 1), "{due}");
        }

        let row: Row = serde_json::from_str(r#"{"at": 1767225600000}"#).unwrap();
        assert_eq!(row.at.unwrap().date_naive(), NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
    }

    #[test]
    fn test_missing_null_and_garbage() {
        let row: Row = serde_json::from_str(r#"{"due": null}"#).unwrap();
        assert!(row.due.is_none());
        assert!(row.at.is_none());

        let row: Row = serde_json::from_str(r#"{"due": "soon", "at": ""}"#).unwrap();
        assert!(row.due.is_none());
        assert!(row.at.is_none());
    }

    #[test]
    fn test_canonical_serialization() {
        let row = Row {
            due: NaiveDate::from_ymd_opt(2026, 3, 1),
            at: None,
        };
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"{"due":"2026-03-01","at":null}"#);
    }
}
