//! The summary returned by a finished run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use simsims_types::{EndReason, PopulationSnapshot, RunId};
use simsims_world::{ConservationResult, LedgerTotals, Stock};
use tracing::{info, warn};

/// Result of [`World::run`](crate::world::World::run).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// The run.
    pub run_id: RunId,
    /// Wall-clock start time.
    pub started_at: DateTime<Utc>,
    /// Why the run stopped.
    pub end_reason: EndReason,
    /// Milliseconds from start until every thread had stopped.
    pub elapsed_ms: u64,
    /// Totals after every thread had stopped.
    pub final_snapshot: PopulationSnapshot,
    /// Creation and destruction tallies.
    pub ledger: LedgerTotals,
    /// Workers placed at construction.
    pub seeded_workers: usize,
    /// Cycles fired across all transitions.
    pub cycles_fired: u64,
    /// Cycles starved across all transitions.
    pub cycles_starved: u64,
    /// Snapshots delivered, including the final one.
    pub snapshots_taken: u64,
    /// Stabilizer passes completed.
    pub stabilizer_passes: u64,
    /// Names of threads that panicked.
    pub faulted: Vec<String>,
}

impl RunReport {
    /// Check the final stock against the ledger.
    ///
    /// Every thread has stopped by the time a report exists, so the result
    /// is exact.
    pub fn conservation(&self) -> ConservationResult {
        let stock = Stock {
            workers: self.final_snapshot.total_workers,
            food: self.final_snapshot.total_food,
            products: self.final_snapshot.total_products,
        };
        self.ledger.verify(&stock)
    }
}

/// Log a structured summary of a finished run.
pub fn log_run_end(report: &RunReport) {
    info!(
        run_id = %report.run_id,
        end_reason = %report.end_reason,
        elapsed_ms = report.elapsed_ms,
        workers = report.final_snapshot.total_workers,
        food = report.final_snapshot.total_food,
        products = report.final_snapshot.total_products,
        born = report.ledger.workers_born,
        died = report.ledger.workers_died,
        cycles_fired = report.cycles_fired,
        stabilizer_passes = report.stabilizer_passes,
        "Run ended"
    );
    if !report.faulted.is_empty() {
        warn!(faulted = ?report.faulted, "Some threads panicked during the run");
    }
    if let ConservationResult::Imbalanced(imbalances) = report.conservation() {
        warn!(?imbalances, "Stock does not match the flow ledger");
    }
}
