//! In-memory transport for testing and single-process use
//!
//! Records every published message and counts session lifecycle calls,
//! with switchable failure injection for connect and publish.

use super::{Connector, Session};
use crate::error::{OutputError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// A message delivered to the in-memory sink
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryMessage {
    pub endpoint: String,
    pub subject: String,
    pub payload: Bytes,
}

#[derive(Debug, Default)]
struct MemorySink {
    messages: Mutex<Vec<MemoryMessage>>,
    connects: AtomicU64,
    publishes: AtomicU64,
    flushes: AtomicU64,
    closes: AtomicU64,
    fail_connect: AtomicBool,
    fail_publish: AtomicBool,
}

/// In-memory connector
///
/// Cloning yields a handle to the same sink, so a test can keep one clone
/// for assertions while an output owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    sink: Arc<MemorySink>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `connect` calls fail
    pub fn fail_connect(&self, fail: bool) {
        self.sink.fail_connect.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent `publish` calls fail
    pub fn fail_publish(&self, fail: bool) {
        self.sink.fail_publish.store(fail, Ordering::SeqCst);
    }

    /// Messages delivered so far, in publish order
    pub fn messages(&self) -> Vec<MemoryMessage> {
        self.sink
            .messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }

    /// Successful session acquisitions
    pub fn connects(&self) -> u64 {
        self.sink.connects.load(Ordering::SeqCst)
    }

    /// Publish attempts, successful or not
    pub fn publishes(&self) -> u64 {
        self.sink.publishes.load(Ordering::SeqCst)
    }

    pub fn flushes(&self) -> u64 {
        self.sink.flushes.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> u64 {
        self.sink.closes.load(Ordering::SeqCst)
    }

    /// Sessions acquired but not yet closed
    pub fn open_sessions(&self) -> u64 {
        self.connects().saturating_sub(self.closes())
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    fn name(&self) -> &str {
        "memory"
    }

    async fn connect(&self, endpoint: &str) -> Result<Box<dyn Session>> {
        if self.sink.fail_connect.load(Ordering::SeqCst) {
            return Err(OutputError::Connection(format!(
                "{}: connection refused",
                endpoint
            )));
        }

        self.sink.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySession {
            sink: self.sink.clone(),
            endpoint: endpoint.to_string(),
            closed: false,
        }))
    }
}

struct MemorySession {
    sink: Arc<MemorySink>,
    endpoint: String,
    closed: bool,
}

#[async_trait]
impl Session for MemorySession {
    async fn publish(&mut self, subject: &str, payload: Bytes) -> Result<()> {
        self.sink.publishes.fetch_add(1, Ordering::SeqCst);

        if self.closed {
            return Err(OutputError::Publish {
                subject: subject.to_string(),
                reason: "session closed".to_string(),
            });
        }
        if self.sink.fail_publish.load(Ordering::SeqCst) {
            return Err(OutputError::Publish {
                subject: subject.to_string(),
                reason: "sink rejected message".to_string(),
            });
        }

        let message = MemoryMessage {
            endpoint: self.endpoint.clone(),
            subject: subject.to_string(),
            payload,
        };
        self.sink
            .messages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message);
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        self.sink.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.sink.closes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
