//! Periodic population sampling.
//!
//! The observer thread hands a [`PopulationSnapshot`] to a
//! [`SnapshotCallback`] at a fixed cadence. After every actor has stopped,
//! the world delivers one final snapshot through the same callback.

use std::time::{Duration, Instant};

use simsims_types::{PopulationSnapshot, RunId};
use simsims_world::PlaceArena;

use crate::signal::StopSignal;

/// Callback invoked with each population sample.
///
/// Implementations can use this to feed a dashboard or an analytics store.
/// The callback runs on the observer thread, then once more on the thread
/// that called [`World::run`](crate::world::World::run).
pub trait SnapshotCallback: Send {
    /// Called with each sample, in time order.
    fn on_snapshot(&mut self, snapshot: &PopulationSnapshot);
}

/// A no-op snapshot callback for testing.
pub struct NoOpCallback;

impl SnapshotCallback for NoOpCallback {
    fn on_snapshot(&mut self, _snapshot: &PopulationSnapshot) {}
}

/// Keeps every snapshot in memory.
#[derive(Debug, Clone, Default)]
pub struct SnapshotLog {
    snapshots: Vec<PopulationSnapshot>,
}

impl SnapshotLog {
    /// An empty log.
    pub const fn new() -> Self {
        Self {
            snapshots: Vec::new(),
        }
    }

    /// Every recorded snapshot, oldest first.
    pub fn snapshots(&self) -> &[PopulationSnapshot] {
        &self.snapshots
    }

    /// The most recent snapshot.
    pub fn last(&self) -> Option<&PopulationSnapshot> {
        self.snapshots.last()
    }
}

impl SnapshotCallback for SnapshotLog {
    fn on_snapshot(&mut self, snapshot: &PopulationSnapshot) {
        self.snapshots.push(*snapshot);
    }
}

/// Sample the arena's current totals.
pub fn sample(run_id: RunId, arena: &PlaceArena, elapsed: Duration) -> PopulationSnapshot {
    let stock = arena.stock();
    PopulationSnapshot {
        run_id,
        elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        total_workers: stock.workers,
        total_products: stock.products,
        total_food: stock.food,
    }
}

/// Deliver snapshots until the signal is raised. Returns how many were
/// delivered.
pub fn run_observer(
    run_id: RunId,
    arena: &PlaceArena,
    stop: &StopSignal,
    interval: Duration,
    started: Instant,
    callback: &mut dyn SnapshotCallback,
) -> u64 {
    let mut delivered: u64 = 0;
    while !stop.wait_timeout(interval) {
        callback.on_snapshot(&sample(run_id, arena, started.elapsed()));
        delivered = delivered.saturating_add(1);
    }
    delivered
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use simsims_types::{EndReason, Food, Worker};
    use simsims_world::{EventSink, NoOpSink, PlaceCounts};

    use super::*;

    fn arena() -> PlaceArena {
        let sink: Arc<dyn EventSink> = Arc::new(NoOpSink);
        let counts = PlaceCounts {
            barracks: 2,
            storages: 1,
            barns: 1,
        };
        match PlaceArena::new(counts, &sink) {
            Ok(arena) => arena,
            Err(e) => panic!("arena should build: {e}"),
        }
    }

    #[test]
    fn sample_reports_totals() {
        let arena = arena();
        if let Some(barrack) = arena.barrack(1) {
            barrack.add(Worker::new());
            barrack.add(Worker::new());
        }
        if let Some(barn) = arena.barn(0) {
            barn.add(Food::new(0.3));
        }
        let run_id = RunId::new();
        let snapshot = sample(run_id, &arena, Duration::from_millis(250));
        assert_eq!(snapshot.run_id, run_id);
        assert_eq!(snapshot.elapsed_ms, 250);
        assert_eq!(snapshot.total_workers, 2);
        assert_eq!(snapshot.total_food, 1);
        assert_eq!(snapshot.total_products, 0);
    }

    #[test]
    fn observer_samples_until_stopped() {
        let arena = arena();
        let stop = StopSignal::new();
        let mut log = SnapshotLog::new();
        let started = Instant::now();
        let delivered = thread::scope(|s| {
            let observer = s.spawn(|| {
                run_observer(
                    RunId::new(),
                    &arena,
                    &stop,
                    Duration::from_millis(5),
                    started,
                    &mut log,
                )
            });
            thread::sleep(Duration::from_millis(60));
            stop.trigger(EndReason::ExternalStop);
            observer.join().unwrap_or(0)
        });
        assert!(delivered > 0);
        let count = u64::try_from(log.snapshots().len()).unwrap_or(0);
        assert_eq!(count, delivered);
        let times: Vec<u64> = log.snapshots().iter().map(|s| s.elapsed_ms).collect();
        assert!(times.windows(2).all(|w| w.first() <= w.last()));
    }
}
