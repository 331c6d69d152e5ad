//! The loop each transition runs on its own thread.
//!
//! ```text
//! running --closed--> closed --reopened--> running
//!    |                  |
//!    +----- stop -------+--> terminated
//! ```
//!
//! `terminated` is reached only through the shared stop signal. A cycle in
//! progress always completes (or rolls back its reservations) before the
//! loop checks the signal again, so no reservation outlives its actor.

use std::time::Duration;

use tracing::debug;

use simsims_types::TransitionId;

use crate::rules::{self, Cycle, CycleContext};
use crate::transition::Transition;

/// Cooperative stop signal observed by actor loops.
///
/// Implemented by the world's stop signal; tests can supply their own.
pub trait Halt: Sync {
    /// Whether the run is over.
    fn halted(&self) -> bool;

    /// Sleep for up to `duration`, waking early when the run ends.
    ///
    /// Returns `true` if the run is over.
    fn pause(&self, duration: Duration) -> bool;
}

/// Lifecycle state of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorState {
    /// Firing cycles.
    Running,
    /// Paused by the stabilizer; polls until reopened.
    Closed,
    /// Stopped for good.
    Terminated,
}

/// What one actor did over its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorSummary {
    /// The actor's transition.
    pub id: TransitionId,
    /// Cycles that consumed and produced tokens.
    pub fired: u64,
    /// Cycles aborted for lack of input.
    pub starved: u64,
    /// Polls spent closed.
    pub closed_polls: u64,
}

impl ActorSummary {
    const fn new(id: TransitionId) -> Self {
        Self {
            id,
            fired: 0,
            starved: 0,
            closed_polls: 0,
        }
    }
}

/// Run `transition` until `halt` reports the end of the run.
pub fn run_actor<H: Halt + ?Sized>(
    transition: &Transition,
    ctx: &CycleContext<'_>,
    halt: &H,
) -> ActorSummary {
    let mut rng = rand::rng();
    let mut summary = ActorSummary::new(transition.id());
    let mut state = ActorState::Running;
    debug!(transition = %transition.id(), "Actor started");

    while !halt.halted() {
        let next = if transition.is_closed() {
            ActorState::Closed
        } else {
            ActorState::Running
        };
        if next != state {
            debug!(transition = %transition.id(), from = ?state, to = ?next, "Actor state changed");
            state = next;
        }

        let delay = if state == ActorState::Closed {
            summary.closed_polls = summary.closed_polls.saturating_add(1);
            ctx.config.closed_backoff()
        } else {
            match rules::fire(transition, ctx, &mut rng) {
                Cycle::Fired => {
                    summary.fired = summary.fired.saturating_add(1);
                    ctx.config.cycle_delay()
                }
                Cycle::Starved => {
                    summary.starved = summary.starved.saturating_add(1);
                    ctx.config.poll_delay()
                }
            }
        };

        if halt.pause(delay) {
            break;
        }
    }

    debug!(
        transition = %transition.id(),
        from = ?state,
        to = ?ActorState::Terminated,
        fired = summary.fired,
        starved = summary.starved,
        "Actor stopped"
    );
    summary
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    use simsims_types::Worker;
    use simsims_world::{EventSink, FlowLedger, NoOpSink, PlaceArena, PlaceCounts};

    use super::*;
    use crate::config::RuleConfig;
    use crate::transition::{Bindings, Rule};

    /// Halts after a fixed number of pauses.
    struct Countdown(AtomicU64);

    impl Halt for Countdown {
        fn halted(&self) -> bool {
            self.0.load(Ordering::SeqCst) == 0
        }

        fn pause(&self, _duration: Duration) -> bool {
            let left = self.0.load(Ordering::SeqCst).saturating_sub(1);
            self.0.store(left, Ordering::SeqCst);
            left == 0
        }
    }

    fn arena() -> PlaceArena {
        let sink: Arc<dyn EventSink> = Arc::new(NoOpSink);
        let counts = PlaceCounts {
            barracks: 1,
            storages: 1,
            barns: 1,
        };
        match PlaceArena::new(counts, &sink) {
            Ok(arena) => arena,
            Err(e) => panic!("arena should build: {e}"),
        }
    }

    const LOOPBACK: Bindings = Bindings {
        barrack_in: 0,
        barrack_out: 0,
        other: 0,
    };

    #[test]
    fn stopped_before_start_runs_nothing() {
        let arena = arena();
        let ledger = FlowLedger::new();
        let config = RuleConfig::default();
        let ctx = CycleContext {
            arena: &arena,
            ledger: &ledger,
            config: &config,
        };
        let Ok(field) = Transition::new(0, Rule::Field, LOOPBACK, &arena) else {
            panic!("transition should build");
        };
        let summary = run_actor(&field, &ctx, &Countdown(AtomicU64::new(0)));
        assert_eq!(summary.fired, 0);
        assert_eq!(summary.starved, 0);
    }

    #[test]
    fn field_fires_once_per_iteration() {
        let arena = arena();
        let ledger = FlowLedger::new();
        let config = RuleConfig {
            field_injury_chance: 0.0,
            ..RuleConfig::default()
        };
        let ctx = CycleContext {
            arena: &arena,
            ledger: &ledger,
            config: &config,
        };
        if let Some(barrack) = arena.barrack(0) {
            barrack.add(Worker::new());
        }
        let Ok(field) = Transition::new(0, Rule::Field, LOOPBACK, &arena) else {
            panic!("transition should build");
        };
        let summary = run_actor(&field, &ctx, &Countdown(AtomicU64::new(5)));
        assert_eq!(summary.fired, 5);
        assert_eq!(arena.total_food(), 5);
        assert_eq!(arena.total_workers(), 1);
    }

    #[test]
    fn empty_inputs_starve() {
        let arena = arena();
        let ledger = FlowLedger::new();
        let config = RuleConfig::default();
        let ctx = CycleContext {
            arena: &arena,
            ledger: &ledger,
            config: &config,
        };
        let Ok(hall) = Transition::new(0, Rule::DiningHall, LOOPBACK, &arena) else {
            panic!("transition should build");
        };
        let summary = run_actor(&hall, &ctx, &Countdown(AtomicU64::new(3)));
        assert_eq!(summary.starved, 3);
        assert_eq!(summary.fired, 0);
    }

    #[test]
    fn closed_actor_only_polls() {
        let arena = arena();
        let ledger = FlowLedger::new();
        let config = RuleConfig::default();
        let ctx = CycleContext {
            arena: &arena,
            ledger: &ledger,
            config: &config,
        };
        if let Some(barrack) = arena.barrack(0) {
            barrack.add(Worker::new());
        }
        let Ok(factory) = Transition::new(0, Rule::Factory { harm_level: 0 }, LOOPBACK, &arena)
        else {
            panic!("transition should build");
        };
        factory.set_closed(true);
        let summary = run_actor(&factory, &ctx, &Countdown(AtomicU64::new(4)));
        assert_eq!(summary.closed_polls, 4);
        assert_eq!(summary.fired, 0);
        assert_eq!(arena.total_products(), 0);
    }
}
