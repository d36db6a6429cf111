//! Connection records served by the capture backend.
//!
//! Contains the wire representation of a connection and the helpers used to
//! classify and display it.

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};

/// Timestamps above this value are read as unix milliseconds.
const MILLIS_THRESHOLD: u64 = 100_000_000_000;

/// Completion state of a captured transaction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// Both request and response were captured
    Complete,
    /// Only the request was captured
    #[serde(alias = "request")]
    RequestOnly,
    /// Only the response was captured
    #[serde(alias = "response")]
    ResponseOnly,
}

impl ConnectionStatus {
    /// Human readable label for half-connections.
    ///
    /// # Returns
    /// * `Option<&'static str>` - `None` for complete connections
    pub fn label(self) -> Option<&'static str> {
        match self {
            ConnectionStatus::Complete => None,
            ConnectionStatus::RequestOnly => Some("Request Only"),
            ConnectionStatus::ResponseOnly => Some("Response Only"),
        }
    }

    /// Wire name of the status (`complete`, `request_only`, `response_only`).
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionStatus::Complete => "complete",
            ConnectionStatus::RequestOnly => "request_only",
            ConnectionStatus::ResponseOnly => "response_only",
        }
    }
}

/// A captured request/response transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Connection {
    /// Connection identifier
    pub id: String,
    /// Protocol name (HTTP, gRPC, ...)
    #[serde(default)]
    pub protocol: String,
    /// Source address
    #[serde(default)]
    pub source: String,
    /// Target address
    #[serde(default)]
    pub target: String,
    /// Capture time, unix seconds or milliseconds
    #[serde(default)]
    pub timestamp: i64,
    /// Captured request payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<serde_json::Value>,
    /// Captured response payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
    /// Completion state; absent means complete
    #[serde(
        default,
        deserialize_with = "deserialize_status",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<ConnectionStatus>,
}

impl Connection {
    /// Create a connection without payloads.
    #[allow(dead_code)] // Connections normally arrive deserialized from the backend
    pub fn new(
        id: impl Into<String>,
        protocol: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        timestamp: i64,
        status: Option<ConnectionStatus>,
    ) -> Self {
        Self {
            id: id.into(),
            protocol: protocol.into(),
            source: source.into(),
            target: target.into(),
            timestamp,
            request: None,
            response: None,
            status,
        }
    }

    /// Status with the absent case resolved to complete.
    pub fn effective_status(&self) -> ConnectionStatus {
        self.status.unwrap_or(ConnectionStatus::Complete)
    }

    /// Whether the request or the response is missing.
    pub fn is_half(&self) -> bool {
        self.effective_status() != ConnectionStatus::Complete
    }

    /// Display classes for the list item.
    ///
    /// # Returns
    /// * `Vec<&'static str>` - `connection-item`, plus `half-connection` and
    ///   the status name for half-connections
    ///
    /// # Details
    /// The list renderer picks its style from these classes.
    pub fn class_names(&self) -> Vec<&'static str> {
        let status = self.effective_status();
        if status == ConnectionStatus::Complete {
            vec!["connection-item"]
        } else {
            vec!["connection-item", "half-connection", status.as_str()]
        }
    }

    /// Capture time as a local date time.
    ///
    /// # Returns
    /// * `Option<DateTime<Local>>` - `None` if the timestamp is out of range
    pub fn captured_at(&self) -> Option<DateTime<Local>> {
        let millis = if self.timestamp.unsigned_abs() > MILLIS_THRESHOLD {
            self.timestamp
        } else {
            self.timestamp.checked_mul(1000)?
        };
        Local.timestamp_millis_opt(millis).single()
    }

    /// Format the capture time as `HH:MM:SS` in local time.
    pub fn format_timestamp(&self) -> String {
        self.captured_at()
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "--:--:--".to_string())
    }
}

/// Deserialize an optional status, treating `""` as absent.
fn deserialize_status<'de, D>(deserializer: D) -> Result<Option<ConnectionStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::value::StrDeserializer;

    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(value) => {
            ConnectionStatus::deserialize(StrDeserializer::<D::Error>::new(value)).map(Some)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_absent_is_complete() {
        let conn: Connection = serde_json::from_str(
            r#"{"id":"a","protocol":"HTTP","source":"10.0.0.1","target":"10.0.0.2","timestamp":1700000000}"#,
        )
        .unwrap();
        assert_eq!(conn.status, None);
        assert_eq!(conn.effective_status(), ConnectionStatus::Complete);
        assert!(!conn.is_half());
        assert_eq!(conn.class_names(), vec!["connection-item"]);
    }

    #[test]
    fn test_status_request_only() {
        let conn: Connection =
            serde_json::from_str(r#"{"id":"b","timestamp":0,"status":"request_only"}"#).unwrap();
        assert!(conn.is_half());
        assert_eq!(conn.effective_status().label(), Some("Request Only"));
        assert_eq!(
            conn.class_names(),
            vec!["connection-item", "half-connection", "request_only"]
        );
    }

    #[test]
    fn test_status_aliases_and_empty() {
        let conn: Connection =
            serde_json::from_str(r#"{"id":"c","status":"response"}"#).unwrap();
        assert_eq!(conn.status, Some(ConnectionStatus::ResponseOnly));
        assert_eq!(conn.effective_status().label(), Some("Response Only"));

        let conn: Connection = serde_json::from_str(r#"{"id":"d","status":""}"#).unwrap();
        assert_eq!(conn.status, None);

        let conn: Connection = serde_json::from_str(r#"{"id":"e","status":null}"#).unwrap();
        assert_eq!(conn.status, None);
    }

    #[test]
    fn test_status_unknown_is_error() {
        let result: Result<Connection, _> =
            serde_json::from_str(r#"{"id":"f","status":"pending"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_payloads_are_kept() {
        let conn: Connection = serde_json::from_str(
            r#"{"id":"g","request":{"method":"GET","path":"/"},"response":null,"status":"request_only"}"#,
        )
        .unwrap();
        assert_eq!(conn.request.as_ref().unwrap()["method"], "GET");
        assert!(conn.response.is_none());
    }

    #[test]
    fn test_timestamp_seconds_and_millis_agree() {
        let secs = Connection::new("a", "HTTP", "s", "t", 1_700_000_000, None);
        let millis = Connection::new("a", "HTTP", "s", "t", 1_700_000_000_000, None);
        assert_eq!(secs.captured_at(), millis.captured_at());
        assert_eq!(secs.format_timestamp(), millis.format_timestamp());
        assert_eq!(secs.format_timestamp().len(), 8);
    }

    #[test]
    fn test_timestamp_out_of_range() {
        let conn = Connection::new("a", "HTTP", "s", "t", i64::MAX, None);
        assert_eq!(conn.format_timestamp(), "--:--:--");
    }
}
