//! Output dispatch protocol
//!
//! `OutputClient` drives one alert through the stages every connector shares:
//!
//! ```text
//! Start ─▶ KeyResolved ─▶ SessionAcquired ─▶ Serialized ─▶ Published
//!                              │                  │             │
//!                        ConnectFailure    SerializeFailure  PublishFailure
//! ```
//!
//! The attempt is counted on entry. Each terminal state is reported to the
//! instrumentation fan-out exactly once and logged with the output name. An
//! acquired session is released (flush, then close) on every path before
//! the outcome is returned. Nothing is retried.

use crate::codec::{JsonCodec, PayloadCodec};
use crate::error::OutputError;
use crate::instrument::{FailureKind, OutputMetrics, Status};
use crate::subject::SubjectTemplate;
use crate::transport::{release, Connector, Session};
use crate::types::{Event, Priority};
use async_trait::async_trait;
use std::sync::Arc;

/// Terminal state of one publish attempt
#[derive(Debug)]
pub enum PublishOutcome {
    /// The sink accepted the payload
    Success { subject: String },
    /// The sink could not be reached
    ConnectFailure(OutputError),
    /// The alert could not be encoded
    SerializeFailure(OutputError),
    /// The sink rejected or could not accept the payload
    PublishFailure(OutputError),
}

impl PublishOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PublishOutcome::Success { .. })
    }

    pub fn status(&self) -> Status {
        if self.is_success() {
            Status::Ok
        } else {
            Status::Error
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            PublishOutcome::Success { .. } => None,
            PublishOutcome::ConnectFailure(_) => Some(FailureKind::Connect),
            PublishOutcome::SerializeFailure(_) => Some(FailureKind::Serialize),
            PublishOutcome::PublishFailure(_) => Some(FailureKind::Publish),
        }
    }

    pub fn error(&self) -> Option<&OutputError> {
        match self {
            PublishOutcome::Success { .. } => None,
            PublishOutcome::ConnectFailure(e)
            | PublishOutcome::SerializeFailure(e)
            | PublishOutcome::PublishFailure(e) => Some(e),
        }
    }

    /// Resolved subject, when the publish succeeded
    pub fn subject(&self) -> Option<&str> {
        match self {
            PublishOutcome::Success { subject } => Some(subject.as_str()),
            _ => None,
        }
    }
}

/// An alert destination
#[async_trait]
pub trait Output: Send + Sync {
    /// Destination name used in logs and metric labels
    fn name(&self) -> &str;

    /// Alerts below this priority are not forwarded
    fn minimum_priority(&self) -> Priority {
        Priority::Debug
    }

    /// Deliver one alert, running to a terminal state
    async fn publish(&self, event: &Event) -> PublishOutcome;
}

/// Generic connector over any [`Connector`] transport
pub struct OutputClient {
    name: String,
    endpoint: String,
    template: SubjectTemplate,
    connector: Arc<dyn Connector>,
    codec: Arc<dyn PayloadCodec>,
    metrics: Arc<OutputMetrics>,
    minimum_priority: Priority,
}

impl OutputClient {
    /// Start building a client for `name` publishing to `endpoint`
    pub fn builder(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        connector: impl Connector + 'static,
    ) -> OutputClientBuilder {
        OutputClientBuilder {
            name: name.into(),
            endpoint: endpoint.into(),
            template: SubjectTemplate::default(),
            connector: Arc::new(connector),
            codec: Arc::new(JsonCodec),
            metrics: None,
            minimum_priority: Priority::Debug,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn subject_template(&self) -> &SubjectTemplate {
        &self.template
    }

    pub fn metrics(&self) -> &Arc<OutputMetrics> {
        &self.metrics
    }

    /// Serialize and publish over an acquired session
    async fn deliver(
        &self,
        session: &mut dyn Session,
        subject: &str,
        event: &Event,
    ) -> PublishOutcome {
        let payload = match self.codec.encode(event) {
            Ok(payload) => payload,
            Err(e) => return PublishOutcome::SerializeFailure(e),
        };

        match session.publish(subject, payload).await {
            Ok(()) => PublishOutcome::Success {
                subject: subject.to_string(),
            },
            Err(e) => PublishOutcome::PublishFailure(e),
        }
    }

    fn report(&self, outcome: &PublishOutcome, subject: &str) {
        match outcome {
            PublishOutcome::Success { .. } => {
                self.metrics.record(&self.name, Status::Ok);
                tracing::info!(output = %self.name, subject = %subject, "Publish OK");
            }
            PublishOutcome::ConnectFailure(e) => {
                self.metrics.record_failure(&self.name, FailureKind::Connect);
                tracing::error!(
                    output = %self.name,
                    endpoint = %self.endpoint,
                    error = %e,
                    "Connection failed"
                );
            }
            PublishOutcome::SerializeFailure(e) => {
                self.metrics.record_failure(&self.name, FailureKind::Serialize);
                tracing::error!(output = %self.name, error = %e, "Serialization failed");
            }
            PublishOutcome::PublishFailure(e) => {
                self.metrics.record_failure(&self.name, FailureKind::Publish);
                tracing::error!(
                    output = %self.name,
                    subject = %subject,
                    error = %e,
                    "Publish failed"
                );
            }
        }
    }
}

#[async_trait]
impl Output for OutputClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn minimum_priority(&self) -> Priority {
        self.minimum_priority
    }

    async fn publish(&self, event: &Event) -> PublishOutcome {
        self.metrics.record(&self.name, Status::Total);

        let subject = self.template.resolve(event);

        let outcome = match self.connector.connect(&self.endpoint).await {
            Ok(mut session) => {
                let outcome = self.deliver(session.as_mut(), &subject, event).await;
                release(session, &self.name).await;
                outcome
            }
            Err(e) => PublishOutcome::ConnectFailure(e),
        };

        self.report(&outcome, &subject);
        outcome
    }
}

impl std::fmt::Debug for OutputClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputClient")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("template", &self.template)
            .field("transport", &self.connector.name())
            .field("minimum_priority", &self.minimum_priority)
            .finish()
    }
}

/// Builder for [`OutputClient`]
pub struct OutputClientBuilder {
    name: String,
    endpoint: String,
    template: SubjectTemplate,
    connector: Arc<dyn Connector>,
    codec: Arc<dyn PayloadCodec>,
    metrics: Option<Arc<OutputMetrics>>,
    minimum_priority: Priority,
}

impl OutputClientBuilder {
    pub fn subject_template(mut self, template: impl Into<SubjectTemplate>) -> Self {
        self.template = template.into();
        self
    }

    pub fn codec(mut self, codec: impl PayloadCodec + 'static) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    /// Share instrumentation with other outputs
    pub fn metrics(mut self, metrics: Arc<OutputMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn minimum_priority(mut self, priority: Priority) -> Self {
        self.minimum_priority = priority;
        self
    }

    pub fn build(self) -> OutputClient {
        OutputClient {
            name: self.name,
            endpoint: self.endpoint,
            template: self.template,
            connector: self.connector,
            codec: self.codec,
            metrics: self
                .metrics
                .unwrap_or_else(|| Arc::new(OutputMetrics::disabled())),
            minimum_priority: self.minimum_priority,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::transport::memory::MemoryConnector;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct BrokenCodec {
        calls: Arc<AtomicUsize>,
    }

    impl PayloadCodec for BrokenCodec {
        fn content_type(&self) -> &str {
            "application/octet-stream"
        }

        fn encode(&self, _event: &Event) -> Result<Bytes> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(OutputError::Serialization("unsupported value".to_string()))
        }
    }

    fn client(connector: &MemoryConnector) -> OutputClient {
        OutputClient::builder("nats", "memory://sink", connector.clone())
            .metrics(Arc::new(OutputMetrics::disabled()))
            .build()
    }

    fn alert() -> Event {
        Event::new(Priority::Critical, "Write below binary dir", "File below /bin opened")
    }

    #[tokio::test]
    async fn test_publish_success() {
        let connector = MemoryConnector::new();
        let output = client(&connector);

        let outcome = output.publish(&alert()).await;
        assert!(outcome.is_success());
        assert_eq!(outcome.subject(), Some("falco.critical.write_below_binary_dir"));
        assert_eq!(outcome.status(), Status::Ok);
        assert!(outcome.error().is_none());

        let stats = output.metrics().stats().snapshot("nats");
        assert_eq!((stats.total, stats.ok, stats.error), (1, 1, 0));
        assert_eq!(connector.open_sessions(), 0);

        let messages = connector.messages();
        assert_eq!(messages.len(), 1);
        let decoded: Event = serde_json::from_slice(&messages[0].payload).unwrap();
        assert_eq!(decoded.rule, "Write below binary dir");
    }

    #[tokio::test]
    async fn test_connect_failure_skips_serialize_and_publish() {
        let connector = MemoryConnector::new();
        connector.fail_connect(true);
        let calls = Arc::new(AtomicUsize::new(0));
        let output = OutputClient::builder("nats", "memory://down", connector.clone())
            .codec(BrokenCodec {
                calls: calls.clone(),
            })
            .build();

        let outcome = output.publish(&alert()).await;
        assert!(matches!(outcome, PublishOutcome::ConnectFailure(OutputError::Connection(_))));
        assert_eq!(outcome.failure_kind(), Some(FailureKind::Connect));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(connector.publishes(), 0);
        assert_eq!(connector.flushes(), 0);

        let stats = output.metrics().stats().snapshot("nats");
        assert_eq!((stats.total, stats.ok, stats.error), (1, 0, 1));
        assert_eq!(stats.connect_errors, 1);
    }

    #[tokio::test]
    async fn test_serialize_failure_releases_session() {
        let connector = MemoryConnector::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let output = OutputClient::builder("nats", "memory://sink", connector.clone())
            .codec(BrokenCodec {
                calls: calls.clone(),
            })
            .build();

        let outcome = output.publish(&alert()).await;
        assert!(matches!(outcome, PublishOutcome::SerializeFailure(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(connector.publishes(), 0);
        assert_eq!(connector.flushes(), 1);
        assert_eq!(connector.closes(), 1);

        let stats = output.metrics().stats().snapshot("nats");
        assert_eq!(stats.error, 1);
        assert_eq!(stats.serialize_errors, 1);
        assert_eq!(stats.publish_errors, 0);
    }

    #[tokio::test]
    async fn test_publish_failure_releases_session() {
        let connector = MemoryConnector::new();
        connector.fail_publish(true);
        let output = client(&connector);

        let outcome = output.publish(&alert()).await;
        assert!(matches!(outcome, PublishOutcome::PublishFailure(_)));
        assert_eq!(outcome.failure_kind(), Some(FailureKind::Publish));
        assert!(outcome.subject().is_none());
        assert_eq!(connector.closes(), 1);
        assert_eq!(connector.open_sessions(), 0);

        let stats = output.metrics().stats().snapshot("nats");
        assert_eq!((stats.total, stats.ok, stats.error), (1, 0, 1));
    }

    #[tokio::test]
    async fn test_each_publish_opens_its_own_session() {
        let connector = MemoryConnector::new();
        let output = client(&connector);

        for _ in 0..3 {
            assert!(output.publish(&alert()).await.is_success());
        }
        assert_eq!(connector.connects(), 3);
        assert_eq!(connector.closes(), 3);
    }

    #[tokio::test]
    async fn test_custom_template_and_priority() {
        let connector = MemoryConnector::new();
        let output = OutputClient::builder("nats", "memory://sink", connector.clone())
            .subject_template("sec.<rule>")
            .minimum_priority(Priority::Warning)
            .build();

        assert_eq!(output.minimum_priority(), Priority::Warning);
        let outcome = output
            .publish(&Event::new(Priority::Notice, "Terminal shell in container", "x"))
            .await;
        assert_eq!(outcome.subject(), Some("sec.terminal_shell_in_container"));
    }

    #[test]
    fn test_debug_shows_transport() {
        let output = client(&MemoryConnector::new());
        let debug = format!("{:?}", output);
        assert!(debug.contains("memory"));
        assert!(debug.contains("memory://sink"));
    }
}
