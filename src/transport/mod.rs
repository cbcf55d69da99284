//! Transport sessions — the seam between an output and its sink
//!
//! A `Connector` opens one `Session` per publish. The session is owned by
//! the publishing call and torn down with [`release`] before the call
//! returns, whatever the outcome. Sessions are never pooled or shared.

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;

pub mod memory;
pub mod nats;

/// Opens sessions against a sink endpoint
#[async_trait]
pub trait Connector: Send + Sync {
    /// Transport name (e.g., "nats", "memory")
    fn name(&self) -> &str;

    /// Acquire a live session
    ///
    /// Failure to reach or negotiate with the sink is returned as
    /// `OutputError::Connection`. No retry is attempted.
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn Session>>;
}

/// One live connection to a sink, scoped to a single publish
#[async_trait]
pub trait Session: Send {
    /// Send `payload` addressed by `subject`
    async fn publish(&mut self, subject: &str, payload: Bytes) -> Result<()>;

    /// Push any buffered data to the sink
    async fn flush(&mut self) -> Result<()>;

    /// Close the connection
    async fn close(&mut self) -> Result<()>;
}

/// Tear down a session: flush, then close
///
/// Errors are logged and swallowed; the publish outcome is already decided
/// by the time a session is released.
pub async fn release(mut session: Box<dyn Session>, output: &str) {
    if let Err(e) = session.flush().await {
        tracing::warn!(output = %output, error = %e, "Session flush failed");
    }
    if let Err(e) = session.close().await {
        tracing::warn!(output = %output, error = %e, "Session close failed");
    }
}
