//! Alert fan-out to multiple outputs
//!
//! `OutputRouter` forwards each alert to every registered output whose
//! minimum priority it meets. Outputs run concurrently and independently;
//! one failing output never affects another.

use crate::output::{Output, PublishOutcome};
use crate::types::Event;
use futures::future::join_all;
use std::sync::Arc;

/// Routes alerts to outputs
#[derive(Default, Clone)]
pub struct OutputRouter {
    outputs: Vec<Arc<dyn Output>>,
}

impl OutputRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an output
    pub fn add(&mut self, output: impl Output + 'static) -> &mut Self {
        self.add_shared(Arc::new(output))
    }

    /// Register an output that is also held elsewhere
    pub fn add_shared(&mut self, output: Arc<dyn Output>) -> &mut Self {
        tracing::info!(
            output = output.name(),
            minimum_priority = %output.minimum_priority(),
            "Output enabled"
        );
        self.outputs.push(output);
        self
    }

    /// Names of registered outputs
    pub fn outputs(&self) -> Vec<&str> {
        self.outputs.iter().map(|o| o.name()).collect()
    }

    /// Forward an alert to every eligible output
    ///
    /// Returns one `(output, outcome)` pair per output that was attempted.
    pub async fn forward(&self, event: &Event) -> Vec<(String, PublishOutcome)> {
        let eligible: Vec<&Arc<dyn Output>> = self
            .outputs
            .iter()
            .filter(|output| {
                let accepted = event.priority >= output.minimum_priority();
                if !accepted {
                    tracing::debug!(
                        output = output.name(),
                        priority = %event.priority,
                        rule = %event.rule,
                        "Alert below output minimum priority"
                    );
                }
                accepted
            })
            .collect();

        join_all(eligible.into_iter().map(|output| async move {
            let outcome = output.publish(event).await;
            (output.name().to_string(), outcome)
        }))
        .await
    }
}

impl std::fmt::Debug for OutputRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputRouter")
            .field("outputs", &self.outputs())
            .finish()
    }
}
