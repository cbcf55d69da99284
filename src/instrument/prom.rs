//! Prometheus exposition registry for output outcomes

use super::{FailureKind, Status};
use crate::error::{OutputError, Result};
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// Output counters registered in an owned Prometheus registry
///
/// `<namespace>_outputs_total{destination,status}` counts outcomes;
/// `<namespace>_output_failures_total{destination,kind}` splits errors by
/// the stage that failed.
#[derive(Clone)]
pub struct PromOutputs {
    registry: Registry,
    outputs: IntCounterVec,
    failures: IntCounterVec,
}

impl PromOutputs {
    /// Register the output counters under `namespace`
    pub fn new(namespace: &str) -> Result<Self> {
        let registry = Registry::new();

        let outputs = IntCounterVec::new(
            Opts::new("outputs_total", "Outputs delivery status").namespace(namespace),
            &["destination", "status"],
        )?;
        registry.register(Box::new(outputs.clone()))?;

        let failures = IntCounterVec::new(
            Opts::new("output_failures_total", "Output failures by failing stage")
                .namespace(namespace),
            &["destination", "kind"],
        )?;
        registry.register(Box::new(failures.clone()))?;

        Ok(Self {
            registry,
            outputs,
            failures,
        })
    }

    pub fn inc(&self, destination: &str, status: Status) {
        self.outputs
            .with_label_values(&[destination, status.as_str()])
            .inc();
    }

    pub fn inc_failure(&self, destination: &str, kind: FailureKind) {
        self.failures
            .with_label_values(&[destination, kind.as_str()])
            .inc();
    }

    pub fn get(&self, destination: &str, status: Status) -> u64 {
        self.outputs
            .with_label_values(&[destination, status.as_str()])
            .get()
    }

    pub fn get_failure(&self, destination: &str, kind: FailureKind) -> u64 {
        self.failures
            .with_label_values(&[destination, kind.as_str()])
            .get()
    }

    /// The underlying registry, for mounting on an HTTP exporter
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render the registry in the Prometheus text exposition format
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| OutputError::Metrics(e.to_string()))
    }
}

impl std::fmt::Debug for PromOutputs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromOutputs").finish_non_exhaustive()
    }
}
