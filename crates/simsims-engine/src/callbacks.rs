//! Log-backed event sink and snapshot callback.
//!
//! [`TracingSink`] forwards every place mutation to `tracing` at trace
//! level. [`LogCallback`] logs each population sample and keeps the
//! range of worker counts seen during the run.

use simsims_core::SnapshotCallback;
use simsims_types::{PlaceEvent, PopulationSnapshot};
use simsims_world::EventSink;
use tracing::{debug, info, trace};

/// Event sink that traces place mutations.
pub struct TracingSink;

impl EventSink for TracingSink {
    fn on_event(&self, event: &PlaceEvent) {
        trace!(
            place = ?event.place,
            change = ?event.change,
            resource = ?event.resource,
            stored = event.stored,
            "Place changed"
        );
    }
}

/// Snapshot callback that logs samples and tracks the worker range.
#[derive(Debug, Default)]
pub struct LogCallback {
    samples: u64,
    min_workers: Option<usize>,
    max_workers: usize,
}

impl LogCallback {
    /// Create an empty callback.
    pub const fn new() -> Self {
        Self {
            samples: 0,
            min_workers: None,
            max_workers: 0,
        }
    }

    /// Log the worker range observed so far.
    pub fn log_summary(&self) {
        info!(
            samples = self.samples,
            min_workers = self.min_workers.unwrap_or(0),
            max_workers = self.max_workers,
            "Population range"
        );
    }
}

impl SnapshotCallback for LogCallback {
    fn on_snapshot(&mut self, snapshot: &PopulationSnapshot) {
        self.samples = self.samples.saturating_add(1);
        self.max_workers = self.max_workers.max(snapshot.total_workers);
        self.min_workers = Some(
            self.min_workers
                .map_or(snapshot.total_workers, |m| m.min(snapshot.total_workers)),
        );
        debug!(
            elapsed_ms = snapshot.elapsed_ms,
            workers = snapshot.total_workers,
            food = snapshot.total_food,
            products = snapshot.total_products,
            "Population sample"
        );
    }
}
