//! # a3s-output
//!
//! Security alert output connectors for the A3S event router.
//!
//! ## Overview
//!
//! `a3s-output` takes a structured alert, derives a routing subject from a
//! template, serializes the alert and publishes it to a downstream sink,
//! reporting every outcome to several observability systems at once.
//! Transports are pluggable (NATS, in-memory) behind one dispatch protocol.
//!
//! ## Quick Start
//!
//! ```rust
//! use a3s_output::{Event, Output, OutputClient, Priority};
//! use a3s_output::transport::memory::MemoryConnector;
//!
//! # async fn example() {
//! let sink = MemoryConnector::new();
//! let output = OutputClient::builder("memory", "memory://local", sink.clone()).build();
//!
//! let alert = Event::new(
//!     Priority::Critical,
//!     "Write below binary dir",
//!     "File below a known binary directory opened for writing",
//! );
//!
//! let outcome = output.publish(&alert).await;
//! assert_eq!(outcome.subject(), Some("falco.critical.write_below_binary_dir"));
//! # }
//! ```
//!
//! ## Transports
//!
//! - **nats** — core NATS publish, one connection per alert
//! - **memory** — in-process sink for tests and local development
//!
//! ## Architecture
//!
//! - **SubjectTemplate** — `<priority>` / `<rule>` routing key expansion
//! - **Connector / Session** — scoped sink connections, always released
//! - **PayloadCodec** — alert encoding (JSON)
//! - **OutputClient** — the dispatch protocol, returns a typed `PublishOutcome`
//! - **OutputMetrics** — internal counters, Prometheus, `metrics` facade and
//!   an asynchronous generic metric emitter
//! - **OutputRouter** — fans one alert out to every eligible output

pub mod codec;
pub mod config;
pub mod error;
pub mod instrument;
pub mod output;
pub mod router;
pub mod subject;
pub mod transport;
pub mod types;

// Re-export core types
pub use codec::{JsonCodec, PayloadCodec};
pub use config::{MetricsConfig, OutputConfig, StatsdConfig};
pub use error::{OutputError, Result};
pub use instrument::{FailureKind, OutputMetrics, Status};
pub use output::{Output, OutputClient, OutputClientBuilder, PublishOutcome};
pub use router::OutputRouter;
pub use subject::{resolve_subject, slugify, SubjectTemplate, DEFAULT_SUBJECT_TEMPLATE};
pub use transport::{Connector, Session};
pub use types::{Event, Priority};

// Re-export transports for convenience
pub use transport::memory::MemoryConnector;
pub use transport::nats::{nats_output, NatsConfig, NatsConnector, NATS_OUTPUT};
