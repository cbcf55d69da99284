//! Tracing-compatible metrics via the `metrics` facade
//!
//! Counters land in whichever recorder is installed: an OTLP bridge in
//! production, or an injected recorder in tests.

use super::Status;
use metrics::{Key, Label, Level, Metadata, Recorder};
use std::sync::Arc;

/// Counter name for output outcomes
pub const OUTPUTS_METRIC: &str = "outputs";

/// Output counters reported through a `metrics` recorder
#[derive(Clone, Default)]
pub struct TelemetryOutputs {
    recorder: Option<Arc<dyn Recorder + Send + Sync>>,
}

impl TelemetryOutputs {
    /// Report through the globally installed recorder
    pub fn global() -> Self {
        Self { recorder: None }
    }

    /// Report through a specific recorder
    pub fn with_recorder(recorder: Arc<dyn Recorder + Send + Sync>) -> Self {
        Self {
            recorder: Some(recorder),
        }
    }

    pub fn inc(&self, destination: &str, status: Status) {
        match &self.recorder {
            Some(recorder) => {
                let key = Key::from_parts(
                    OUTPUTS_METRIC,
                    vec![
                        Label::new("destination", destination.to_string()),
                        Label::new("status", status.as_str()),
                    ],
                );
                let metadata = Metadata::new(module_path!(), Level::INFO, Some(module_path!()));
                recorder.register_counter(&key, &metadata).increment(1);
            }
            None => {
                metrics::counter!(
                    OUTPUTS_METRIC,
                    "destination" => destination.to_string(),
                    "status" => status.as_str()
                )
                .increment(1);
            }
        }
    }
}

impl std::fmt::Debug for TelemetryOutputs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryOutputs")
            .field("global", &self.recorder.is_none())
            .finish()
    }
}
