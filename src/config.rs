//! Output and instrumentation configuration
//!
//! Plain serde structs with defaults. Loading them from files or the
//! environment is left to the embedding router.

use crate::error::{OutputError, Result};
use crate::instrument::emitter::DEFAULT_QUEUE_CAPACITY;
use crate::transport::nats::NatsConfig;
use serde::{Deserialize, Serialize};

/// StatsD / DogStatsD agent settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsdConfig {
    /// Agent address (e.g., "127.0.0.1:8125")
    pub address: String,

    /// Prepended to every metric name
    #[serde(default = "default_statsd_prefix")]
    pub prefix: String,

    /// Emit DogStatsD tags
    #[serde(default = "default_true")]
    pub dogstatsd: bool,
}

fn default_statsd_prefix() -> String {
    "a3s.".to_string()
}

fn default_true() -> bool {
    true
}

/// Instrumentation settings shared by all outputs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Prometheus metric namespace (default: a3s)
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Capacity of the asynchronous metric queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Optional StatsD agent for generic metrics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statsd: Option<StatsdConfig>,
}

fn default_namespace() -> String {
    "a3s".to_string()
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            queue_capacity: default_queue_capacity(),
            statsd: None,
        }
    }
}

impl MetricsConfig {
    pub fn validate(&self) -> Result<()> {
        let valid_namespace = self
            .namespace
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !self.namespace.starts_with(|c: char| c.is_ascii_digit());
        if !valid_namespace {
            return Err(OutputError::Config(format!(
                "Invalid metrics namespace '{}'",
                self.namespace
            )));
        }
        if self.queue_capacity == 0 {
            return Err(OutputError::Config(
                "metrics queue_capacity must be greater than 0".to_string(),
            ));
        }
        if let Some(statsd) = &self.statsd {
            if statsd.address.trim().is_empty() {
                return Err(OutputError::Config(
                    "statsd address must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Top-level configuration for the output connectors
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub nats: NatsConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl OutputConfig {
    pub fn validate(&self) -> Result<()> {
        self.nats.validate()?;
        self.metrics.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Priority;

    #[test]
    fn test_default_config() {
        let config = OutputConfig::default();
        assert_eq!(config.metrics.namespace, "a3s");
        assert_eq!(config.metrics.queue_capacity, 1024);
        assert!(config.metrics.statsd.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_deserialize() {
        let json = r#"{
            "nats": {
                "url": "nats://10.0.0.5:4222",
                "subject_template": "security.<priority>.<rule>",
                "minimum_priority": "Critical"
            },
            "metrics": {
                "namespace": "sidekick",
                "statsd": {"address": "127.0.0.1:8125"}
            }
        }"#;

        let config: OutputConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.nats.url, "nats://10.0.0.5:4222");
        assert_eq!(config.nats.minimum_priority, Priority::Critical);
        assert_eq!(
            config.nats.subject_template.as_str(),
            "security.<priority>.<rule>"
        );
        assert_eq!(config.metrics.namespace, "sidekick");
        assert_eq!(config.metrics.queue_capacity, 1024);

        let statsd = config.metrics.statsd.unwrap();
        assert_eq!(statsd.prefix, "a3s.");
        assert!(statsd.dogstatsd);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: OutputConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.nats.url, "nats://127.0.0.1:4222");
        assert_eq!(config.metrics.namespace, "a3s");
    }

    #[test]
    fn test_metrics_validation() {
        let bad_namespace = MetricsConfig {
            namespace: "a3s-output".to_string(),
            ..Default::default()
        };
        assert!(bad_namespace.validate().is_err());

        let digit_namespace = MetricsConfig {
            namespace: "1a3s".to_string(),
            ..Default::default()
        };
        assert!(digit_namespace.validate().is_err());

        let zero_queue = MetricsConfig {
            queue_capacity: 0,
            ..Default::default()
        };
        assert!(zero_queue.validate().is_err());

        let empty_statsd = MetricsConfig {
            statsd: Some(StatsdConfig {
                address: String::new(),
                prefix: String::new(),
                dogstatsd: false,
            }),
            ..Default::default()
        };
        assert!(empty_statsd.validate().is_err());

        let empty_namespace = MetricsConfig {
            namespace: String::new(),
            ..Default::default()
        };
        assert!(empty_namespace.validate().is_ok());
    }

    #[test]
    fn test_output_config_propagates_nats_errors() {
        let mut config = OutputConfig::default();
        config.nats.url.clear();
        assert!(matches!(config.validate(), Err(OutputError::Config(_))));
    }
}
