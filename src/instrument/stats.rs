//! Internal rolling counters
//!
//! Per-destination atomic counters for attempts, outcomes and failure
//! kinds. Snapshots serialise to JSON for debug endpoints.

use super::{FailureKind, Status};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
struct Counters {
    total: AtomicU64,
    ok: AtomicU64,
    error: AtomicU64,
    connect_errors: AtomicU64,
    serialize_errors: AtomicU64,
    publish_errors: AtomicU64,
}

/// Point-in-time view of one destination's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub total: u64,
    pub ok: u64,
    pub error: u64,
    pub connect_errors: u64,
    pub serialize_errors: u64,
    pub publish_errors: u64,
}

/// Process-wide output counters keyed by destination
#[derive(Debug, Default)]
pub struct OutputStats {
    outputs: RwLock<HashMap<String, Arc<Counters>>>,
}

impl OutputStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn counters(&self, destination: &str) -> Arc<Counters> {
        {
            let outputs = self.outputs.read().unwrap_or_else(|e| e.into_inner());
            if let Some(counters) = outputs.get(destination) {
                return counters.clone();
            }
        }

        let mut outputs = self.outputs.write().unwrap_or_else(|e| e.into_inner());
        outputs
            .entry(destination.to_string())
            .or_default()
            .clone()
    }

    /// Increment the counter for `status`
    pub fn add(&self, destination: &str, status: Status) {
        let counters = self.counters(destination);
        let counter = match status {
            Status::Total => &counters.total,
            Status::Ok => &counters.ok,
            Status::Error => &counters.error,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the diagnostic counter for a failure kind
    pub fn add_failure(&self, destination: &str, kind: FailureKind) {
        let counters = self.counters(destination);
        let counter = match kind {
            FailureKind::Connect => &counters.connect_errors,
            FailureKind::Serialize => &counters.serialize_errors,
            FailureKind::Publish => &counters.publish_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self, destination: &str, status: Status) -> u64 {
        let snapshot = self.snapshot(destination);
        match status {
            Status::Total => snapshot.total,
            Status::Ok => snapshot.ok,
            Status::Error => snapshot.error,
        }
    }

    /// Snapshot one destination; unknown destinations read as zero
    pub fn snapshot(&self, destination: &str) -> StatsSnapshot {
        let outputs = self.outputs.read().unwrap_or_else(|e| e.into_inner());
        outputs
            .get(destination)
            .map(|c| snapshot_of(c))
            .unwrap_or_default()
    }

    /// Snapshot every destination seen so far
    pub fn snapshot_all(&self) -> HashMap<String, StatsSnapshot> {
        let outputs = self.outputs.read().unwrap_or_else(|e| e.into_inner());
        outputs
            .iter()
            .map(|(name, c)| (name.clone(), snapshot_of(c)))
            .collect()
    }
}

fn snapshot_of(c: &Counters) -> StatsSnapshot {
    StatsSnapshot {
        total: c.total.load(Ordering::Relaxed),
        ok: c.ok.load(Ordering::Relaxed),
        error: c.error.load(Ordering::Relaxed),
        connect_errors: c.connect_errors.load(Ordering::Relaxed),
        serialize_errors: c.serialize_errors.load(Ordering::Relaxed),
        publish_errors: c.publish_errors.load(Ordering::Relaxed),
    }
}
