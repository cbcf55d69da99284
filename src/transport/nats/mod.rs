//! NATS transport
//!
//! Core NATS publish over `async-nats`. Each session is a fresh client
//! connection that is flushed and dropped when the publish completes.

mod config;

pub use config::NatsConfig;

use super::{Connector, Session};
use crate::codec::JsonCodec;
use crate::error::{OutputError, Result};
use crate::instrument::OutputMetrics;
use crate::output::OutputClient;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;

/// Destination name used for logs and metric labels
pub const NATS_OUTPUT: &str = "nats";

/// Opens NATS client connections
#[derive(Debug, Clone)]
pub struct NatsConnector {
    config: Arc<NatsConfig>,
}

impl NatsConnector {
    pub fn new(config: NatsConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &NatsConfig {
        &self.config
    }
}

#[async_trait]
impl Connector for NatsConnector {
    fn name(&self) -> &str {
        NATS_OUTPUT
    }

    async fn connect(&self, endpoint: &str) -> Result<Box<dyn Session>> {
        let client = build_connect_options(&self.config)
            .connect(endpoint)
            .await
            .map_err(|e| OutputError::Connection(format!("{}: {}", endpoint, e)))?;

        tracing::debug!(url = %endpoint, "Connected to NATS");

        Ok(Box::new(NatsSession {
            client: Some(client),
        }))
    }
}

/// A single NATS connection
pub struct NatsSession {
    client: Option<async_nats::Client>,
}

impl NatsSession {
    fn client(&self) -> Result<&async_nats::Client> {
        self.client
            .as_ref()
            .ok_or_else(|| OutputError::Connection("NATS session already closed".to_string()))
    }
}

#[async_trait]
impl Session for NatsSession {
    async fn publish(&mut self, subject: &str, payload: Bytes) -> Result<()> {
        let client = self.client().map_err(|e| OutputError::Publish {
            subject: subject.to_string(),
            reason: e.to_string(),
        })?;

        client
            .publish(subject.to_string(), payload)
            .await
            .map_err(|e| OutputError::Publish {
                subject: subject.to_string(),
                reason: e.to_string(),
            })
    }

    async fn flush(&mut self) -> Result<()> {
        self.client()?
            .flush()
            .await
            .map_err(|e| OutputError::Release(format!("flush failed: {}", e)))
    }

    async fn close(&mut self) -> Result<()> {
        // Dropping the last client handle shuts the connection down.
        if self.client.take().is_some() {
            tracing::debug!("NATS connection closed");
        }
        Ok(())
    }
}

/// Build the NATS output: `nats` destination, JSON payloads
pub fn nats_output(config: NatsConfig, metrics: Arc<OutputMetrics>) -> Result<OutputClient> {
    config.validate()?;

    let endpoint = config.url.clone();
    let template = config.subject_template.clone();
    let minimum_priority = config.minimum_priority;

    Ok(
        OutputClient::builder(NATS_OUTPUT, endpoint, NatsConnector::new(config))
            .subject_template(template)
            .codec(JsonCodec)
            .metrics(metrics)
            .minimum_priority(minimum_priority)
            .build(),
    )
}

/// Build NATS connect options from config
fn build_connect_options(config: &NatsConfig) -> async_nats::ConnectOptions {
    let mut opts = async_nats::ConnectOptions::new()
        .connection_timeout(Duration::from_secs(config.connect_timeout_secs))
        .request_timeout(Some(Duration::from_secs(config.request_timeout_secs)))
        .require_tls(config.require_tls);

    if let Some(ref token) = config.token {
        opts = opts.token(token.clone());
    }

    if let (Some(user), Some(password)) = (&config.user, &config.password) {
        opts = opts.user_and_password(user.clone(), password.clone());
    }

    if let Some(ref name) = config.client_name {
        opts = opts.name(name.clone());
    }

    opts
}
