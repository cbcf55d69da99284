//! Fire-and-forget generic metric emission
//!
//! Callers enqueue `MetricEvent`s on a bounded queue without waiting; a
//! single background worker forwards each one to every configured sink.
//! When the queue is full the event is dropped and counted, so a slow or
//! dead sink never blocks a publish or grows memory without bound.

use crate::error::{OutputError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;

/// Default queue capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// A named counter increment with free-form tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricEvent {
    pub name: String,
    pub value: i64,
    pub tags: Vec<String>,
}

impl MetricEvent {
    pub fn count(name: impl Into<String>, value: i64, tags: Vec<String>) -> Self {
        Self {
            name: name.into(),
            value,
            tags,
        }
    }
}

/// Destination for generic metric events
#[async_trait]
pub trait MetricSink: Send + Sync {
    fn name(&self) -> &str;

    async fn count(&self, event: &MetricEvent) -> Result<()>;
}

/// Handle for enqueuing metric events
#[derive(Debug, Clone)]
pub struct MetricEmitter {
    tx: Option<mpsc::Sender<MetricEvent>>,
    dropped: Arc<AtomicU64>,
}

impl MetricEmitter {
    /// Start the background worker
    ///
    /// Must be called from within a Tokio runtime. The worker exits once
    /// every emitter clone has been dropped and the queue is drained.
    pub fn spawn(sinks: Vec<Arc<dyn MetricSink>>, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        tokio::spawn(run_worker(rx, sinks));

        Self {
            tx: Some(tx),
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// An emitter that discards every event
    pub fn disabled() -> Self {
        Self {
            tx: None,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Enqueue an event without waiting
    ///
    /// Returns false when the event was dropped.
    pub fn emit(&self, event: MetricEvent) -> bool {
        let Some(tx) = &self.tx else {
            return false;
        };

        match tx.try_send(event) {
            Ok(()) => true,
            Err(e) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                let reason = match e {
                    mpsc::error::TrySendError::Full(_) => "queue full",
                    mpsc::error::TrySendError::Closed(_) => "worker stopped",
                };
                tracing::debug!(reason, "Metric event dropped");
                false
            }
        }
    }

    /// Events dropped because the queue was full or the worker had stopped
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }
}

async fn run_worker(mut rx: mpsc::Receiver<MetricEvent>, sinks: Vec<Arc<dyn MetricSink>>) {
    while let Some(event) = rx.recv().await {
        for sink in &sinks {
            if let Err(e) = sink.count(&event).await {
                tracing::warn!(
                    sink = sink.name(),
                    metric = %event.name,
                    error = %e,
                    "Failed to emit metric"
                );
            }
        }
    }
    tracing::debug!("Metric emitter stopped");
}

/// Writes metric events to the tracing log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMetricSink;

#[async_trait]
impl MetricSink for LogMetricSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn count(&self, event: &MetricEvent) -> Result<()> {
        tracing::debug!(
            metric = %event.name,
            value = event.value,
            tags = ?event.tags,
            "Metric"
        );
        Ok(())
    }
}

/// Sends metric events to a StatsD or DogStatsD agent over UDP
#[derive(Debug)]
pub struct StatsdMetricSink {
    socket: UdpSocket,
    address: String,
    prefix: String,
    dogstatsd: bool,
}

impl StatsdMetricSink {
    /// Bind a local UDP socket for sending to `address`
    pub async fn connect(
        address: impl Into<String>,
        prefix: impl Into<String>,
        dogstatsd: bool,
    ) -> Result<Self> {
        let address = address.into();
        let socket = UdpSocket::bind("0.0.0.0:0")
            .await
            .map_err(|e| OutputError::Metrics(format!("statsd bind failed: {}", e)))?;

        Ok(Self {
            socket,
            address,
            prefix: prefix.into(),
            dogstatsd,
        })
    }

    /// Format an event as a StatsD counter line
    ///
    /// Tags are only emitted in DogStatsD mode.
    pub fn format_line(&self, event: &MetricEvent) -> String {
        format_statsd_line(&self.prefix, event, self.dogstatsd)
    }
}

fn format_statsd_line(prefix: &str, event: &MetricEvent, dogstatsd: bool) -> String {
    let mut line = format!("{}{}:{}|c", prefix, event.name, event.value);
    if dogstatsd && !event.tags.is_empty() {
        line.push_str("|#");
        line.push_str(&event.tags.join(","));
    }
    line
}

#[async_trait]
impl MetricSink for StatsdMetricSink {
    fn name(&self) -> &str {
        if self.dogstatsd {
            "dogstatsd"
        } else {
            "statsd"
        }
    }

    async fn count(&self, event: &MetricEvent) -> Result<()> {
        let line = self.format_line(event);
        self.socket
            .send_to(line.as_bytes(), self.address.as_str())
            .await
            .map_err(|e| OutputError::Metrics(format!("statsd send to {} failed: {}", self.address, e)))?;
        Ok(())
    }
}

/// Keeps metric events in memory, for tests
#[derive(Debug, Clone, Default)]
pub struct MemoryMetricSink {
    events: Arc<Mutex<Vec<MetricEvent>>>,
}

impl MemoryMetricSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<MetricEvent> {
        self.events
            .lock()
            .map(|e| e.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }
}

#[async_trait]
impl MetricSink for MemoryMetricSink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn count(&self, event: &MetricEvent) -> Result<()> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.clone());
        Ok(())
    }
}
