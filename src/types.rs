//! Core alert types for the a3s-output system
//!
//! Field names follow the Falco JSON payload so alerts forwarded by the
//! router can be decoded and re-encoded without loss.

use crate::error::{OutputError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Alert severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    #[default]
    Debug,
    Informational,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

impl Priority {
    /// All priorities in ascending order
    pub const ALL: [Priority; 8] = [
        Priority::Debug,
        Priority::Informational,
        Priority::Notice,
        Priority::Warning,
        Priority::Error,
        Priority::Critical,
        Priority::Alert,
        Priority::Emergency,
    ];

    /// Capitalised name as emitted by Falco (e.g., "Critical")
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Debug => "Debug",
            Priority::Informational => "Informational",
            Priority::Notice => "Notice",
            Priority::Warning => "Warning",
            Priority::Error => "Error",
            Priority::Critical => "Critical",
            Priority::Alert => "Alert",
            Priority::Emergency => "Emergency",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = OutputError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Priority::Debug),
            "informational" | "info" => Ok(Priority::Informational),
            "notice" => Ok(Priority::Notice),
            "warning" => Ok(Priority::Warning),
            "error" => Ok(Priority::Error),
            "critical" => Ok(Priority::Critical),
            "alert" => Ok(Priority::Alert),
            "emergency" => Ok(Priority::Emergency),
            other => Err(OutputError::Config(format!("Unknown priority '{}'", other))),
        }
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A single security alert
///
/// Produced upstream by the detection engine and treated as read-only
/// by every output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique alert identifier
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uuid: String,

    /// Human-readable alert line
    pub output: String,

    /// Severity
    pub priority: Priority,

    /// Name of the rule that fired
    pub rule: String,

    /// When the alert was raised
    pub time: DateTime<Utc>,

    /// Structured fields extracted by the rule
    #[serde(default)]
    pub output_fields: BTreeMap<String, serde_json::Value>,

    /// Event source (e.g., "syscall", "k8s_audit")
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,

    /// Rule tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Host that raised the alert
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hostname: String,
}

impl Event {
    /// Create a new alert with auto-generated uuid and timestamp
    pub fn new(priority: Priority, rule: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            uuid: uuid::Uuid::new_v4().to_string(),
            output: output.into(),
            priority,
            rule: rule.into(),
            time: Utc::now(),
            output_fields: BTreeMap::new(),
            source: String::new(),
            tags: Vec::new(),
            hostname: String::new(),
        }
    }

    /// Add an output field
    pub fn with_field(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.output_fields.insert(key.into(), value);
        self
    }

    /// Add a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = time;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Emergency > Priority::Alert);
        assert!(Priority::Critical > Priority::Error);
        assert!(Priority::Warning > Priority::Notice);
        assert!(Priority::Debug < Priority::Informational);
        assert_eq!(Priority::default(), Priority::Debug);

        let mut sorted = Priority::ALL;
        sorted.sort();
        assert_eq!(sorted, Priority::ALL);
    }

    #[test]
    fn test_priority_parse() {
        assert_eq!("Critical".parse::<Priority>().unwrap(), Priority::Critical);
        assert_eq!("WARNING".parse::<Priority>().unwrap(), Priority::Warning);
        assert_eq!("info".parse::<Priority>().unwrap(), Priority::Informational);
        assert_eq!(" notice ".parse::<Priority>().unwrap(), Priority::Notice);
        assert!("severe".parse::<Priority>().is_err());
    }

    #[test]
    fn test_priority_display_round_trips_through_parse() {
        for priority in Priority::ALL {
            assert_eq!(priority.to_string().parse::<Priority>().unwrap(), priority);
        }
    }

    #[test]
    fn test_priority_serialization() {
        let json = serde_json::to_string(&Priority::Critical).unwrap();
        assert_eq!(json, "\"Critical\"");

        let parsed: Priority = serde_json::from_str("\"emergency\"").unwrap();
        assert_eq!(parsed, Priority::Emergency);

        assert!(serde_json::from_str::<Priority>("\"nope\"").is_err());
    }

    #[test]
    fn test_event_new() {
        let event = Event::new(
            Priority::Warning,
            "Terminal shell in container",
            "A shell was spawned",
        );
        assert_eq!(event.priority, Priority::Warning);
        assert_eq!(event.rule, "Terminal shell in container");
        assert!(!event.uuid.is_empty());
        assert!(event.output_fields.is_empty());
    }

    #[test]
    fn test_event_serialization_keeps_falco_field_names() {
        let event = Event::new(Priority::Critical, "Write below binary dir", "File opened")
            .with_field("proc.name", serde_json::json!("bash"))
            .with_field("fd.num", serde_json::json!(3))
            .with_tag("filesystem")
            .with_source("syscall")
            .with_hostname("node-1");

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"priority\":\"Critical\""));
        assert!(json.contains("\"rule\":\"Write below binary dir\""));
        assert!(json.contains("\"output_fields\":{\"fd.num\":3,\"proc.name\":\"bash\"}"));
        assert!(json.contains("\"tags\":[\"filesystem\"]"));
        assert!(json.contains("\"hostname\":\"node-1\""));

        let parsed: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_event_skips_empty_optional_fields() {
        let mut event = Event::new(Priority::Notice, "rule", "out");
        event.uuid.clear();

        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("uuid"));
        assert!(!json.contains("source"));
        assert!(!json.contains("tags"));
        assert!(!json.contains("hostname"));
    }

    #[test]
    fn test_event_deserialize_minimal_falco_payload() {
        let json = r#"{
            "output": "16:31:56.746609046: Error File below a known binary directory opened for writing",
            "priority": "Error",
            "rule": "Write below binary dir",
            "time": "2019-05-17T15:31:56.746609046Z",
            "output_fields": {"evt.time": 1558107116746609046, "user.name": "root"}
        }"#;

        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.priority, Priority::Error);
        assert_eq!(event.rule, "Write below binary dir");
        assert_eq!(event.output_fields["user.name"], serde_json::json!("root"));
        assert!(event.uuid.is_empty());
        assert!(event.tags.is_empty());
    }
}
