//! NATS output configuration

use crate::error::{OutputError, Result};
use crate::subject::SubjectTemplate;
use crate::types::Priority;
use serde::{Deserialize, Serialize};

/// Configuration for the NATS output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NatsConfig {
    /// Server URL (default: nats://127.0.0.1:4222)
    #[serde(default = "default_url")]
    pub url: String,

    /// Subject template; empty uses `falco.<priority>.<rule>`
    #[serde(default)]
    pub subject_template: SubjectTemplate,

    /// Alerts below this priority are not forwarded
    #[serde(default)]
    pub minimum_priority: Priority,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Authentication token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Username for user/password authentication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Client name reported to the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,

    /// Refuse to connect without TLS
    #[serde(default)]
    pub require_tls: bool,
}

fn default_url() -> String {
    "nats://127.0.0.1:4222".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            subject_template: SubjectTemplate::default(),
            minimum_priority: Priority::default(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            token: None,
            user: None,
            password: None,
            client_name: None,
            require_tls: false,
        }
    }
}

impl NatsConfig {
    /// Check the configuration for values that can never connect
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(OutputError::Config("NATS url must not be empty".to_string()));
        }
        if self.connect_timeout_secs == 0 {
            return Err(OutputError::Config(
                "NATS connect_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(OutputError::Config(
                "NATS request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.user.is_some() != self.password.is_some() {
            return Err(OutputError::Config(
                "NATS user and password must be set together".to_string(),
            ));
        }
        if self.token.is_some() && self.user.is_some() {
            return Err(OutputError::Config(
                "NATS token and user/password are mutually exclusive".to_string(),
            ));
        }
        Ok(())
    }
}
