//! Termination watchdog.
//!
//! Polls at a fixed interval and raises the stop signal when every barrack
//! is empty or the wall-clock budget has elapsed. The first check runs
//! immediately, so a world seeded with no workers stops at once.

use std::time::{Duration, Instant};

use simsims_types::EndReason;
use simsims_world::{FlowLedger, PlaceArena};
use tracing::debug;

use crate::config::TerminationConfig;
use crate::signal::StopSignal;

/// Whether the worker population is gone for good.
///
/// An empty set of barracks is not enough: a worker may be held by a
/// transition between `get` and `add`. Emptiness counts only if no worker
/// was in transit before or after the scan and no transit completed while
/// the barracks were read.
pub fn population_exhausted(arena: &PlaceArena, ledger: &FlowLedger) -> bool {
    let epoch = ledger.transit_epoch();
    if ledger.in_transit() != 0 || !arena.all_barracks_empty() {
        return false;
    }
    ledger.in_transit() == 0 && ledger.transit_epoch() == epoch
}

/// One watchdog check. Returns the reason to stop, if any.
pub fn check(
    arena: &PlaceArena,
    ledger: &FlowLedger,
    budget: Option<Duration>,
    elapsed: Duration,
) -> Option<EndReason> {
    if population_exhausted(arena, ledger) {
        return Some(EndReason::BarracksEmpty);
    }
    match budget {
        Some(budget) if elapsed >= budget => Some(EndReason::BudgetElapsed),
        _ => None,
    }
}

/// Run the watchdog until the signal is raised, by it or anyone else.
pub fn run_watchdog(
    arena: &PlaceArena,
    ledger: &FlowLedger,
    stop: &StopSignal,
    config: &TerminationConfig,
    started: Instant,
) {
    let budget = config.budget();
    loop {
        if let Some(reason) = check(arena, ledger, budget, started.elapsed()) {
            if stop.trigger(reason) {
                debug!(%reason, elapsed_ms = started.elapsed().as_millis(), "Watchdog ended run");
            }
            return;
        }
        if stop.wait_timeout(config.poll_interval()) {
            return;
        }
    }
}
