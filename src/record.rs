//! Log records and structured detail payloads

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{LogError, Result};
use crate::severity::Severity;

/// Structured detail attached to a record
pub type Detail = Map<String, Value>;

/// A single log event
///
/// Built once per emission call and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub severity: Severity,
    pub message: String,
    pub detail: Option<Detail>,
    /// When the emission call was made
    pub timestamp: DateTime<Utc>,
}

impl LogRecord {
    /// Create a record stamped with the current time
    pub fn new(severity: Severity, message: impl Into<String>, detail: Option<Detail>) -> Self {
        Self {
            severity,
            message: message.into(),
            detail,
            timestamp: Utc::now(),
        }
    }

    /// Replace the timestamp (fixed clocks in tests and replays)
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Convert any serializable value into a detail map
///
/// Objects become the map directly. Any other value is wrapped as `{"value": v}`.
pub fn detail_from<T: Serialize + ?Sized>(value: &T) -> Result<Detail> {
    let value = serde_json::to_value(value).map_err(|e| LogError::Format(e.to_string()))?;
    Ok(detail_from_value(value))
}

/// Wrap a JSON value as a detail map
pub fn detail_from_value(value: Value) -> Detail {
    match value {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}

/// Detail used in place of a payload that failed to convert
pub(crate) fn unrepresentable(err: &LogError) -> Detail {
    let mut map = Map::new();
    map.insert(
        "unrepresentable".to_string(),
        Value::String(err.to_string()),
    );
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::Error as _;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_detail_from_struct() {
        #[derive(Serialize)]
        struct Request {
            path: &'static str,
            status: u16,
        }

        let detail = detail_from(&Request {
            path: "/health",
            status: 200,
        })
        .unwrap();
        assert_eq!(detail.get("path"), Some(&json!("/health")));
        assert_eq!(detail.get("status"), Some(&json!(200)));
    }

    #[test]
    fn test_detail_from_scalar_is_wrapped() {
        let detail = detail_from(&42).unwrap();
        assert_eq!(detail.get("value"), Some(&json!(42)));
    }

    #[test]
    fn test_non_string_keys_are_format_errors() {
        let mut map = HashMap::new();
        map.insert((1, 2), "tuple key");
        let err = detail_from(&map).unwrap_err();
        assert!(matches!(err, LogError::Format(_)));
    }

    #[test]
    fn test_failing_serializer_is_format_error() {
        struct Broken;
        impl Serialize for Broken {
            fn serialize<S: serde::Serializer>(
                &self,
                _: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                Err(S::Error::custom("cannot serialize"))
            }
        }

        let err = detail_from(&Broken).unwrap_err();
        let fallback = unrepresentable(&err);
        assert!(fallback["unrepresentable"]
            .as_str()
            .unwrap()
            .contains("cannot serialize"));
    }

    #[test]
    fn test_record_at_overrides_timestamp() {
        let ts = DateTime::parse_from_rfc3339("2026-01-21T14:30:45Z")
            .unwrap()
            .with_timezone(&Utc);
        let record = LogRecord::new(Severity::Info, "hello", None).at(ts);
        assert_eq!(record.timestamp, ts);
        assert_eq!(record.message, "hello");
    }
}
