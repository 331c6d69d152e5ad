//! Feedback controller that keeps stock levels near their targets.
//!
//! Every pass samples the stored totals and, per transition kind, compares
//! the quantity that kind regulates against its target:
//!
//! | Kind        | Regulates | Closes more when stock is |
//! |-------------|-----------|---------------------------|
//! | Field       | food      | above target              |
//! | Factory     | products  | above target              |
//! | Home        | workers   | above target              |
//! | DiningHall  | food      | below target              |
//!
//! The desired number of closed instances is
//! `clamp(round(count * deviation / target), 0, count - 1)`, and a pass moves
//! the actual number at most one step toward it. A kind is therefore never
//! fully closed and never overshoots its desired count.
//!
//! A pass also nudges every home's priority in proportion to the worker
//! deviation and may rewire one random transition toward better-stocked
//! inputs and emptier outputs.

use std::time::Instant;

use rand::Rng;
use rand::seq::IndexedRandom;
use simsims_transitions::{Slot, Transition};
use simsims_types::{PlaceId, Port, TransitionId, TransitionKind};
use simsims_world::{PlaceArena, Stock};
use tracing::{debug, warn};

use crate::config::StabilizerConfig;
use crate::signal::StopSignal;

/// How many instances of a kind should be closed.
///
/// `inverted` flips the sign of the deviation, for kinds that consume the
/// quantity they regulate.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn closed_target(count: usize, actual: usize, target: usize, inverted: bool) -> usize {
    let Some(max_closed) = count.checked_sub(1) else {
        return 0;
    };
    let deviation = actual as f64 - target as f64;
    let deviation = if inverted { -deviation } else { deviation };
    let raw = (count as f64 * deviation / target.max(1) as f64).round();
    raw.clamp(0.0, max_closed as f64) as usize
}

/// The stock a kind regulates, and whether it consumes it.
const fn regulated(kind: TransitionKind, stock: &Stock, config: &StabilizerConfig) -> (usize, usize, bool) {
    match kind {
        TransitionKind::Field => (stock.food, config.target_food, false),
        TransitionKind::DiningHall => (stock.food, config.target_food, true),
        TransitionKind::Factory => (stock.products, config.target_products, false),
        TransitionKind::Home => (stock.workers, config.target_workers, false),
    }
}

/// A transition closed or reopened by a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Toggle {
    /// The transition.
    pub transition: TransitionId,
    /// Its new state.
    pub closed: bool,
}

/// A binding moved by a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rewire {
    /// The transition.
    pub transition: TransitionId,
    /// The binding that moved.
    pub slot: Slot,
    /// Previously bound place.
    pub from: PlaceId,
    /// Newly bound place.
    pub to: PlaceId,
}

/// What one pass changed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PassReport {
    /// Stock sampled at the start of the pass.
    pub stock: Stock,
    /// At most one toggle per transition kind.
    pub toggles: Vec<Toggle>,
    /// Home priority after the nudge, if there are homes.
    pub priority: Option<f64>,
    /// Bindings moved by rewiring.
    pub rewires: Vec<Rewire>,
}

/// The controller, bound to one world's places and transitions.
#[derive(Debug, Clone, Copy)]
pub struct Stabilizer<'a> {
    config: &'a StabilizerConfig,
    arena: &'a PlaceArena,
    transitions: &'a [Transition],
}

impl<'a> Stabilizer<'a> {
    /// Bind a controller to a world.
    pub const fn new(
        config: &'a StabilizerConfig,
        arena: &'a PlaceArena,
        transitions: &'a [Transition],
    ) -> Self {
        Self {
            config,
            arena,
            transitions,
        }
    }

    /// Run one control pass.
    pub fn pass<R: Rng + ?Sized>(&self, rng: &mut R) -> PassReport {
        let stock = self.arena.stock();
        let toggles = TransitionKind::ALL
            .into_iter()
            .filter_map(|kind| self.toggle_one(kind, &stock, rng))
            .collect();
        let priority = self.nudge_priorities(&stock);
        let rewires = if self.config.rewire {
            self.rewire_one(rng)
        } else {
            Vec::new()
        };
        PassReport {
            stock,
            toggles,
            priority,
            rewires,
        }
    }

    /// Move the number of closed instances of `kind` one step toward its
    /// target.
    fn toggle_one<R: Rng + ?Sized>(
        &self,
        kind: TransitionKind,
        stock: &Stock,
        rng: &mut R,
    ) -> Option<Toggle> {
        let instances: Vec<&Transition> =
            self.transitions.iter().filter(|t| t.kind() == kind).collect();
        let (actual, target, inverted) = regulated(kind, stock, self.config);
        let desired = closed_target(instances.len(), actual, target, inverted);
        let (closed, open): (Vec<&Transition>, Vec<&Transition>) =
            instances.into_iter().partition(|t| t.is_closed());

        let (pool, close) = match closed.len().cmp(&desired) {
            core::cmp::Ordering::Less => (open, true),
            core::cmp::Ordering::Greater => (closed, false),
            core::cmp::Ordering::Equal => return None,
        };
        let chosen = pool.choose(rng)?;
        chosen.set_closed(close);
        debug!(transition = %chosen.id(), closed = close, actual, target, desired, "Toggled transition");
        Some(Toggle {
            transition: chosen.id(),
            closed: close,
        })
    }

    /// Shift every home's priority by at most `priority_gain`, upward when
    /// workers exceed their target.
    fn nudge_priorities(&self, stock: &Stock) -> Option<f64> {
        let delta = priority_delta(stock.workers, self.config.target_workers, self.config.priority_gain);
        let mut last = None;
        for home in self.transitions.iter().filter(|t| t.kind() == TransitionKind::Home) {
            last = home.nudge_priority(delta);
        }
        if let Some(priority) = last {
            debug!(delta, priority, "Nudged home priority");
        }
        last
    }

    /// Rebind one random transition's weakest input and most congested
    /// output.
    fn rewire_one<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Rewire> {
        let Some(transition) = self.transitions.choose(rng) else {
            return Vec::new();
        };
        let kind = transition.kind();
        let mut rewires = Vec::new();

        let inputs = Slot::ALL.into_iter().filter(|s| s.port(kind) == Port::Input);
        if let Some((slot, from)) = self.extreme_slot(transition, inputs, false) {
            if let Some(to) = self.arena.most_loaded(from.kind) {
                rewires.extend(self.rebind_if_better(transition, slot, from, to, true));
            }
        }

        let outputs = Slot::ALL.into_iter().filter(|s| s.port(kind) == Port::Output);
        if let Some((slot, from)) = self.extreme_slot(transition, outputs, true) {
            if let Some(to) = self.arena.least_loaded(from.kind) {
                rewires.extend(self.rebind_if_better(transition, slot, from, to, false));
            }
        }
        rewires
    }

    /// The slot whose bound place is least (or most) loaded.
    fn extreme_slot(
        &self,
        transition: &Transition,
        slots: impl Iterator<Item = Slot>,
        most: bool,
    ) -> Option<(Slot, PlaceId)> {
        let loaded = slots.filter_map(|slot| {
            let place = transition.place(slot);
            self.arena.load(place).map(|load| (slot, place, load))
        });
        let pick = if most {
            loaded.max_by_key(|&(_, _, load)| load)
        } else {
            loaded.min_by_key(|&(_, _, load)| load)
        };
        pick.map(|(slot, place, _)| (slot, place))
    }

    /// Rebind `slot` from `from` to `to` when `to` is strictly fuller (for
    /// inputs) or strictly emptier (for outputs).
    fn rebind_if_better(
        &self,
        transition: &Transition,
        slot: Slot,
        from: PlaceId,
        to: PlaceId,
        want_fuller: bool,
    ) -> Option<Rewire> {
        let from_load = self.arena.load(from)?;
        let to_load = self.arena.load(to)?;
        let better = if want_fuller {
            to_load > from_load
        } else {
            to_load < from_load
        };
        if !better {
            return None;
        }
        match transition.rebind(slot, to, self.arena) {
            Ok(previous) => {
                debug!(transition = %transition.id(), ?slot, from = %previous, to = %to, "Rewired transition");
                Some(Rewire {
                    transition: transition.id(),
                    slot,
                    from: previous,
                    to,
                })
            }
            Err(e) => {
                warn!(transition = %transition.id(), error = %e, "Rewire rejected");
                None
            }
        }
    }
}

/// Priority change for a worker deviation: proportional, at most `gain` in
/// either direction.
#[allow(clippy::cast_precision_loss)]
pub fn priority_delta(workers: usize, target: usize, gain: f64) -> f64 {
    let relative = (workers as f64 - target as f64) / target.max(1) as f64;
    gain * relative.clamp(-1.0, 1.0)
}

/// Run passes until the signal is raised. Returns the number of passes.
pub fn run_stabilizer(stabilizer: &Stabilizer<'_>, stop: &StopSignal, started: Instant) -> u64 {
    let mut rng = rand::rng();
    let mut passes: u64 = 0;
    while !stop.wait_timeout(stabilizer.config.interval()) {
        let report = stabilizer.pass(&mut rng);
        passes = passes.saturating_add(1);
        debug!(
            pass = passes,
            elapsed_ms = started.elapsed().as_millis(),
            workers = report.stock.workers,
            food = report.stock.food,
            products = report.stock.products,
            toggles = report.toggles.len(),
            rewires = report.rewires.len(),
            "Stabilizer pass"
        );
    }
    passes
}
