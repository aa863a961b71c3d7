//! Metrics State
//!
//! The single shared, mutable dataset: last observed [`StatusSignal`] per
//! target key. The scheduler writes, scrape requests read.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::domain::{StatusSignal, TargetKey};

/// Concurrency-safe map from `(url, tag)` to the latest status signal.
///
/// Backed by a fair `parking_lot::RwLock`, so a steady stream of scrapes
/// cannot starve the scheduler's writes or the other way round. Entries
/// are never removed: a target that starts failing keeps its series, now
/// reporting `0`.
#[derive(Debug, Default)]
pub struct MetricsState {
    entries: RwLock<BTreeMap<TargetKey, StatusSignal>>,
    sweeps_completed: AtomicU64,
}

impl MetricsState {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the signal recorded for `key`
    pub fn write(&self, key: TargetKey, signal: StatusSignal) {
        self.entries.write().insert(key, signal);
    }

    /// Consistent snapshot of every entry, ordered by key
    pub fn read_all(&self) -> Vec<(TargetKey, StatusSignal)> {
        self.entries
            .read()
            .iter()
            .map(|(key, signal)| (key.clone(), *signal))
            .collect()
    }

    /// Latest signal for a single key
    pub fn get(&self, key: &TargetKey) -> Option<StatusSignal> {
        self.entries.read().get(key).copied()
    }

    /// Number of keys recorded so far
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if nothing has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Mark the end of a sweep
    pub fn record_sweep(&self) {
        self.sweeps_completed.fetch_add(1, Ordering::Release);
    }

    /// Number of sweeps completed since startup
    pub fn sweeps_completed(&self) -> u64 {
        self.sweeps_completed.load(Ordering::Acquire)
    }
}
