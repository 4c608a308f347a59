use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a monitored site, usually a URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Target(String);

impl Target {
    pub fn new(target: impl Into<String>) -> Self {
        Self(target.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Target {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Target {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Target {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Classification of a single probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Transport succeeded with a 2xx response
    Up,
    /// Transport succeeded with any other response code
    Down,
    /// Transport failed (DNS, connect, timeout, ...)
    Error,
}

impl Status {
    pub fn is_up(self) -> bool {
        self == Status::Up
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Up => write!(f, "up"),
            Status::Down => write!(f, "down"),
            Status::Error => write!(f, "error"),
        }
    }
}

/// Result of a monitoring check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    /// URL or target that was checked
    pub target: Target,

    /// Status of the check (up/down/error)
    pub status: Status,

    /// HTTP status code, absent when the transport failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    /// Response time in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,

    /// Error message (if the transport failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// When the probe finished
    pub checked_at: DateTime<Utc>,
}

impl CheckResult {
    /// Create a bare result with only a classification
    pub fn new(target: Target, status: Status) -> Self {
        Self {
            target,
            status,
            status_code: None,
            latency_ms: None,
            error_message: None,
            checked_at: Utc::now(),
        }
    }

    pub fn up(target: Target, latency_ms: u64, status_code: u16) -> Self {
        Self::new(target, Status::Up).with_response(latency_ms, status_code)
    }

    pub fn down(target: Target, latency_ms: u64, status_code: u16) -> Self {
        Self::new(target, Status::Down).with_response(latency_ms, status_code)
    }

    pub fn error(target: Target, message: impl Into<String>) -> Self {
        let mut result = Self::new(target, Status::Error);
        result.error_message = Some(message.into());
        result
    }

    fn with_response(mut self, latency_ms: u64, status_code: u16) -> Self {
        self.latency_ms = Some(latency_ms);
        self.status_code = Some(status_code);
        self
    }

    /// Set latency if the prober did not measure it itself
    pub fn with_latency_if_missing(mut self, latency_ms: u64) -> Self {
        self.latency_ms.get_or_insert(latency_ms);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        assert_eq!(Status::Up.to_string(), "up");
        assert_eq!(Status::Down.to_string(), "down");
        assert_eq!(Status::Error.to_string(), "error");
    }

    #[test]
    fn test_error_result_has_no_response_fields() {
        let result = CheckResult::error(Target::from("https://example.com"), "connection refused");
        assert_eq!(result.status, Status::Error);
        assert_eq!(result.status_code, None);
        assert_eq!(result.error_message.as_deref(), Some("connection refused"));
    }

    #[test]
    fn test_measured_latency_is_kept() {
        let result = CheckResult::up(Target::from("a"), 12, 200).with_latency_if_missing(99);
        assert_eq!(result.latency_ms, Some(12));

        let result = CheckResult::new(Target::from("a"), Status::Up).with_latency_if_missing(99);
        assert_eq!(result.latency_ms, Some(99));
    }

    #[test]
    fn test_json_shape() {
        let result = CheckResult::down(Target::from("https://example.com/missing"), 5, 404);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["target"], "https://example.com/missing");
        assert_eq!(value["status"], "down");
        assert_eq!(value["status_code"], 404);
        assert!(value.get("error_message").is_none());
    }
}
