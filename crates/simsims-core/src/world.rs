//! World construction and run orchestration.
//!
//! [`World::new`] allocates the places, wires every transition to random
//! places of the right kinds, and seeds the initial workers. [`World::run`]
//! then starts one thread per transition plus the watchdog, stabilizer, and
//! observer, and blocks until the stop signal has been raised and every
//! thread has returned.
//!
//! Threads are scoped to the run, so they borrow the world's places and
//! transitions directly. There is no world-wide lock: each place guards
//! itself and the ledger is lock-free.

use std::sync::Arc;
use std::thread::{self, Scope, ScopedJoinHandle};
use std::time::Instant;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use simsims_transitions::{Bindings, CycleContext, Rule, Transition, run_actor, vitals};
use simsims_types::{EndReason, PlaceKind, RunId, TransitionKind, Worker};
use simsims_world::{EventSink, FlowLedger, PlaceArena, WorldError};
use tracing::{debug, info, warn};

use crate::config::SimulationConfig;
use crate::observer::{SnapshotCallback, run_observer, sample};
use crate::report::RunReport;
use crate::signal::{ShutdownHandle, StopSignal};
use crate::stabilizer::{Stabilizer, run_stabilizer};
use crate::watchdog::run_watchdog;

/// One simulation: places, transitions, and the shared stop signal.
#[derive(Debug)]
pub struct World {
    run_id: RunId,
    config: SimulationConfig,
    arena: PlaceArena,
    transitions: Vec<Transition>,
    ledger: FlowLedger,
    stop: Arc<StopSignal>,
    seeded: usize,
}

impl World {
    /// Build and wire a world.
    ///
    /// Transitions are created kind by kind (dining halls, homes, fields,
    /// factories), each bound to a random input barrack, a random output
    /// barrack, and a random barn or storage. Workers are then placed into
    /// random barracks. Randomness here comes from `world.seed` when set.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Unwireable`] if any place count is zero.
    pub fn new(config: SimulationConfig, sink: Arc<dyn EventSink>) -> Result<Self, WorldError> {
        let mut rng = config
            .world
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        let arena = PlaceArena::new(config.world.place_counts(), &sink)?;

        let mut transitions = Vec::new();
        for kind in TransitionKind::ALL {
            for index in 0..config.world.transitions(kind) {
                let rule = match kind {
                    TransitionKind::Field => Rule::Field,
                    TransitionKind::DiningHall => Rule::DiningHall,
                    TransitionKind::Home => Rule::home(config.rules.initial_priority()),
                    TransitionKind::Factory => Rule::Factory {
                        harm_level: vitals::harm_level(&mut rng, &config.rules),
                    },
                };
                let bindings = random_bindings(kind, &arena, &mut rng);
                let transition = Transition::new(index, rule, bindings, &arena)?;
                debug!(transition = %transition, ?bindings, "Wired transition");
                transitions.push(transition);
            }
        }

        let ledger = FlowLedger::new();
        let barracks = arena.count(PlaceKind::Barrack);
        let mut seeded: usize = 0;
        for _ in 0..config.world.initial_workers {
            if let Some(barrack) = arena.barrack(rng.random_range(0..barracks)) {
                barrack.add(Worker::new());
                seeded = seeded.saturating_add(1);
            }
        }
        ledger.record_seeded(u64::try_from(seeded).unwrap_or(u64::MAX));

        let run_id = RunId::new();
        info!(
            run_id = %run_id,
            barracks,
            storages = arena.count(PlaceKind::Storage),
            barns = arena.count(PlaceKind::Barn),
            transitions = transitions.len(),
            workers = seeded,
            "World built"
        );

        Ok(Self {
            run_id,
            config,
            arena,
            transitions,
            ledger,
            stop: Arc::new(StopSignal::new()),
            seeded,
        })
    }

    /// This run's identifier.
    pub const fn run_id(&self) -> RunId {
        self.run_id
    }

    /// The configuration the world was built from.
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// The places.
    pub const fn arena(&self) -> &PlaceArena {
        &self.arena
    }

    /// Every transition, in wiring order.
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Creation and destruction tallies.
    pub const fn ledger(&self) -> &FlowLedger {
        &self.ledger
    }

    /// Workers placed at construction.
    pub const fn seeded_workers(&self) -> usize {
        self.seeded
    }

    /// A handle that ends the run from another thread.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle::new(Arc::clone(&self.stop))
    }

    /// Run until the barracks empty, the budget elapses, or a stop is
    /// requested.
    ///
    /// Snapshots go to `callback` at the observer cadence, followed by one
    /// final snapshot taken after every thread has stopped.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Spawn`] if a thread cannot be started. Threads
    /// that did start are stopped and joined first.
    pub fn run(self, callback: &mut dyn SnapshotCallback) -> Result<RunReport, WorldError> {
        let started_at = Utc::now();
        let started = Instant::now();
        info!(run_id = %self.run_id, transitions = self.transitions.len(), "Run started");

        let run_id = self.run_id;
        let arena = &self.arena;
        let ledger = &self.ledger;
        let stop: &StopSignal = &self.stop;
        let ctx = CycleContext {
            arena,
            ledger,
            config: &self.config.rules,
        };
        let termination = &self.config.termination;
        let stabilizer = Stabilizer::new(&self.config.stabilizer, arena, &self.transitions);
        let stabilizer_enabled = self.config.stabilizer.enabled;
        let sample_interval = self.config.observer.sample_interval();
        let observer_callback = &mut *callback;

        let tally = thread::scope(|scope| {
            let mut error = None;
            let mut actors = Vec::with_capacity(self.transitions.len());
            for transition in &self.transitions {
                let name = format!("actor-{}", transition.id());
                match spawn(scope, name, move || run_actor(transition, &ctx, stop)) {
                    Ok(handle) => actors.push(handle),
                    Err(e) => {
                        error = Some(e);
                        break;
                    }
                }
            }

            let watchdog = error.is_none().then(|| {
                spawn(scope, "watchdog".to_owned(), move || {
                    run_watchdog(arena, ledger, stop, termination, started);
                })
            });
            let watchdog = settle(watchdog, &mut error);

            let stabilizing = (error.is_none() && stabilizer_enabled).then(|| {
                spawn(scope, "stabilizer".to_owned(), move || {
                    run_stabilizer(&stabilizer, stop, started)
                })
            });
            let stabilizing = settle(stabilizing, &mut error);

            let observing = error.is_none().then(|| {
                spawn(scope, "observer".to_owned(), move || {
                    run_observer(run_id, arena, stop, sample_interval, started, observer_callback)
                })
            });
            let observing = settle(observing, &mut error);

            if error.is_some() {
                stop.trigger(EndReason::ExternalStop);
            }

            let mut tally = Tally::default();
            // Joined first: nothing else raises the signal if it died.
            if let Some(handle) = watchdog {
                if handle.join(&mut tally.faulted).is_none() {
                    stop.trigger(EndReason::ExternalStop);
                }
            }
            for handle in actors {
                if let Some(summary) = handle.join(&mut tally.faulted) {
                    tally.fired = tally.fired.saturating_add(summary.fired);
                    tally.starved = tally.starved.saturating_add(summary.starved);
                }
            }
            if let Some(handle) = stabilizing {
                tally.passes = handle.join(&mut tally.faulted).unwrap_or(0);
            }
            if let Some(handle) = observing {
                tally.snapshots = handle.join(&mut tally.faulted).unwrap_or(0);
            }
            error.map_or(Ok(tally), Err)
        })?;

        let elapsed = started.elapsed();
        let final_snapshot = sample(self.run_id, &self.arena, elapsed);
        callback.on_snapshot(&final_snapshot);

        Ok(RunReport {
            run_id: self.run_id,
            started_at,
            end_reason: self.stop.reason().unwrap_or(EndReason::ExternalStop),
            elapsed_ms: final_snapshot.elapsed_ms,
            final_snapshot,
            ledger: self.ledger.totals(),
            seeded_workers: self.seeded,
            cycles_fired: tally.fired,
            cycles_starved: tally.starved,
            snapshots_taken: tally.snapshots.saturating_add(1),
            stabilizer_passes: tally.passes,
            faulted: tally.faulted,
        })
    }
}

/// Random bindings for a transition of `kind`.
fn random_bindings<R: Rng + ?Sized>(kind: TransitionKind, arena: &PlaceArena, rng: &mut R) -> Bindings {
    let barracks = arena.count(PlaceKind::Barrack);
    let others = arena.count(kind.other_binding().0);
    Bindings {
        barrack_in: rng.random_range(0..barracks),
        barrack_out: rng.random_range(0..barracks),
        other: rng.random_range(0..others),
    }
}

/// Counters gathered while joining threads.
#[derive(Debug, Default)]
struct Tally {
    fired: u64,
    starved: u64,
    passes: u64,
    snapshots: u64,
    faulted: Vec<String>,
}

/// A scoped thread and its name.
struct Named<'scope, T> {
    name: String,
    handle: ScopedJoinHandle<'scope, T>,
}

impl<T> Named<'_, T> {
    /// Join, recording the thread as faulted if it panicked.
    fn join(self, faulted: &mut Vec<String>) -> Option<T> {
        if let Ok(value) = self.handle.join() {
            return Some(value);
        }
        warn!(thread = %self.name, "Thread panicked");
        faulted.push(self.name);
        None
    }
}

fn spawn<'scope, T, F>(
    scope: &'scope Scope<'scope, '_>,
    name: String,
    f: F,
) -> Result<Named<'scope, T>, WorldError>
where
    F: FnOnce() -> T + Send + 'scope,
    T: Send + 'scope,
{
    match thread::Builder::new().name(name.clone()).spawn_scoped(scope, f) {
        Ok(handle) => Ok(Named { name, handle }),
        Err(source) => Err(WorldError::Spawn { name, source }),
    }
}

/// Keep a spawned handle, or move its spawn error into `error`.
fn settle<'scope, T>(
    spawned: Option<Result<Named<'scope, T>, WorldError>>,
    error: &mut Option<WorldError>,
) -> Option<Named<'scope, T>> {
    match spawned? {
        Ok(handle) => Some(handle),
        Err(e) => {
            *error = Some(e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use simsims_world::NoOpSink;

    use super::*;
    use crate::config::WorldConfig;

    fn config(world: WorldConfig) -> SimulationConfig {
        SimulationConfig {
            world,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn missing_place_kind_is_unwireable() {
        let cfg = config(WorldConfig {
            barns: 0,
            ..WorldConfig::default()
        });
        let result = World::new(cfg, Arc::new(NoOpSink));
        assert!(matches!(
            result,
            Err(WorldError::Unwireable {
                barracks: 1,
                storages: 1,
                barns: 0,
            })
        ));
    }

    #[test]
    fn construction_wires_every_transition_and_seeds_workers() {
        let cfg = config(WorldConfig {
            seed: Some(17),
            barracks: 3,
            storages: 2,
            barns: 2,
            dining_halls: 2,
            homes: 1,
            fields: 3,
            factories: 4,
            initial_workers: 25,
        });
        let Ok(world) = World::new(cfg, Arc::new(NoOpSink)) else {
            panic!("world should build");
        };
        assert_eq!(world.transitions().len(), 10);
        assert_eq!(world.arena().total_workers(), 25);
        assert_eq!(world.seeded_workers(), 25);
        assert_eq!(world.ledger().totals().workers_seeded, 25);

        let kinds: Vec<TransitionKind> = world.transitions().iter().map(Transition::kind).collect();
        assert_eq!(kinds.first(), Some(&TransitionKind::DiningHall));
        assert_eq!(kinds.last(), Some(&TransitionKind::Factory));
        assert!(
            world
                .transitions()
                .iter()
                .filter_map(Transition::harm_level)
                .all(|h| h < 10)
        );
        assert!(
            world
                .transitions()
                .iter()
                .filter_map(Transition::priority)
                .all(|p| (p - 0.5).abs() < f64::EPSILON)
        );
    }

    #[test]
    fn same_seed_gives_same_wiring() {
        let cfg = config(WorldConfig {
            seed: Some(99),
            barracks: 4,
            storages: 3,
            barns: 3,
            ..WorldConfig::default()
        });
        let (Ok(a), Ok(b)) = (
            World::new(cfg.clone(), Arc::new(NoOpSink)),
            World::new(cfg, Arc::new(NoOpSink)),
        ) else {
            panic!("worlds should build");
        };
        let wiring = |w: &World| -> Vec<Bindings> {
            w.transitions().iter().map(Transition::bindings).collect()
        };
        assert_eq!(wiring(&a), wiring(&b));
        assert_eq!(a.arena().loads(PlaceKind::Barrack), b.arena().loads(PlaceKind::Barrack));
        assert_ne!(a.run_id(), b.run_id());
    }
}
