//! Output instrumentation fan-out
//!
//! Every publish outcome is reported to four independent sinks:
//!
//! - **stats** — internal per-destination atomic counters
//! - **prom** — Prometheus registry, `{destination, status}` labels
//! - **telemetry** — `metrics` facade counter with the same labels
//! - **emitter** — asynchronous generic metric tagged `output:<dest>`, `status:<ok|error>`
//!
//! The first three are updated before [`OutputMetrics::record`] returns.
//! The emitter only enqueues; delivery is neither awaited nor guaranteed.

pub mod emitter;
pub mod prom;
pub mod stats;
pub mod telemetry;

pub use emitter::{
    LogMetricSink, MemoryMetricSink, MetricEmitter, MetricEvent, MetricSink, StatsdMetricSink,
};
pub use prom::PromOutputs;
pub use stats::{OutputStats, StatsSnapshot};
pub use telemetry::TelemetryOutputs;

use crate::config::MetricsConfig;
use crate::error::Result;
use std::fmt;
use std::sync::Arc;

/// Name of the generic metric emitted per outcome
pub const OUTPUTS_EVENT: &str = "outputs";

/// Outcome label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// An attempt started
    Total,
    Ok,
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Total => "total",
            Status::Ok => "ok",
            Status::Error => "error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The stage at which a publish failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Connect,
    Serialize,
    Publish,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Connect => "connect",
            FailureKind::Serialize => "serialize",
            FailureKind::Publish => "publish",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All outcome sinks behind one call
#[derive(Debug, Clone)]
pub struct OutputMetrics {
    stats: Arc<OutputStats>,
    prom: PromOutputs,
    telemetry: TelemetryOutputs,
    emitter: MetricEmitter,
}

impl OutputMetrics {
    pub fn new(prom: PromOutputs, telemetry: TelemetryOutputs, emitter: MetricEmitter) -> Self {
        Self {
            stats: Arc::new(OutputStats::new()),
            prom,
            telemetry,
            emitter,
        }
    }

    /// Build every sink from configuration
    ///
    /// Spawns the emitter worker, so it must run inside a Tokio runtime.
    pub async fn from_config(config: &MetricsConfig) -> Result<Self> {
        config.validate()?;

        let mut sinks: Vec<Arc<dyn MetricSink>> = vec![Arc::new(LogMetricSink)];
        if let Some(statsd) = &config.statsd {
            let sink =
                StatsdMetricSink::connect(&statsd.address, &statsd.prefix, statsd.dogstatsd).await?;
            tracing::info!(address = %statsd.address, sink = sink.name(), "StatsD metrics enabled");
            sinks.push(Arc::new(sink));
        }

        Ok(Self::new(
            PromOutputs::new(&config.namespace)?,
            TelemetryOutputs::global(),
            MetricEmitter::spawn(sinks, config.queue_capacity),
        ))
    }

    /// Sinks that record nothing outside this process
    ///
    /// Counters still work; the emitter discards and telemetry goes to the
    /// global recorder (a no-op unless one is installed).
    pub fn disabled() -> Self {
        let prom = match PromOutputs::new("") {
            Ok(prom) => prom,
            Err(e) => unreachable!("static output counters failed to register: {}", e),
        };
        Self::new(prom, TelemetryOutputs::global(), MetricEmitter::disabled())
    }

    /// Report one outcome for `destination`
    ///
    /// `Total` marks the start of an attempt and only touches the internal
    /// counters. `Ok` and `Error` are reported to every sink.
    pub fn record(&self, destination: &str, status: Status) {
        if status == Status::Total {
            self.stats.add(destination, Status::Total);
            return;
        }

        self.emitter.emit(MetricEvent::count(
            OUTPUTS_EVENT,
            1,
            vec![
                format!("output:{}", destination),
                format!("status:{}", status),
            ],
        ));
        self.stats.add(destination, status);
        self.prom.inc(destination, status);
        self.telemetry.inc(destination, status);
    }

    /// Report a failure: `error` everywhere, plus its stage
    pub fn record_failure(&self, destination: &str, kind: FailureKind) {
        self.record(destination, Status::Error);
        self.stats.add_failure(destination, kind);
        self.prom.inc_failure(destination, kind);
    }

    pub fn stats(&self) -> &OutputStats {
        &self.stats
    }

    pub fn prom(&self) -> &PromOutputs {
        &self.prom
    }

    pub fn emitter(&self) -> &MetricEmitter {
        &self.emitter
    }
}
