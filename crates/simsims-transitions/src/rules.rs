//! The four production rules.
//!
//! Each rule runs one cycle against a copy of its transition's bindings:
//!
//! 1. Reserve every input, in a fixed order. If any reservation fails,
//!    release the ones already held and report [`Cycle::Starved`].
//! 2. Retrieve the reserved tokens.
//! 3. Transform them and write the outputs back. A worker that died in the
//!    transform is discarded by the barrack it is returned to.
//!
//! Every creation and destruction is reported to the [`FlowLedger`], and
//! every worker is marked in transit from just before its retrieval until
//! just after it is written back.

use rand::Rng;
use simsims_types::{Food, Product, Worker};
use simsims_world::{Admission, FlowLedger, Place, PlaceArena};
use tracing::{trace, warn};

use crate::config::{RuleConfig, probability};
use crate::transition::{Bindings, Rule, Transition};
use crate::vitals;

/// Outcome of one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    /// Inputs were consumed and outputs written.
    Fired,
    /// An input was unavailable; nothing changed.
    Starved,
}

/// Everything a cycle reads besides the transition itself.
#[derive(Debug, Clone, Copy)]
pub struct CycleContext<'a> {
    /// The places.
    pub arena: &'a PlaceArena,
    /// Creation and destruction tallies.
    pub ledger: &'a FlowLedger,
    /// Rule parameters.
    pub config: &'a RuleConfig,
}

/// Run one cycle of `transition`.
pub fn fire<R: Rng + ?Sized>(transition: &Transition, ctx: &CycleContext<'_>, rng: &mut R) -> Cycle {
    let bindings = transition.bindings();
    let Some((input, output)) = barracks(ctx.arena, &bindings) else {
        warn!(transition = %transition.id(), "Bound barrack missing from arena");
        return Cycle::Starved;
    };
    let cycle = match transition.rule() {
        Rule::Field => ctx.arena.barn(bindings.other).map_or(Cycle::Starved, |barn| {
            field(input, output, barn, ctx, rng)
        }),
        Rule::DiningHall => ctx
            .arena
            .barn(bindings.other)
            .map_or(Cycle::Starved, |barn| dining_hall(input, output, barn, ctx)),
        Rule::Home { priority } => ctx.arena.storage(bindings.other).map_or(Cycle::Starved, |storage| {
            home(input, output, storage, priority.get(), ctx, rng)
        }),
        Rule::Factory { harm_level } => ctx.arena.storage(bindings.other).map_or(Cycle::Starved, |storage| {
            factory(input, output, storage, *harm_level, ctx, rng)
        }),
    };
    trace!(transition = %transition.id(), ?cycle, "Cycle finished");
    cycle
}

fn barracks<'a>(
    arena: &'a PlaceArena,
    bindings: &Bindings,
) -> Option<(&'a Place<Worker>, &'a Place<Worker>)> {
    Some((arena.barrack(bindings.barrack_in)?, arena.barrack(bindings.barrack_out)?))
}

/// Write a worker back and close its transit. Dead workers are tallied.
fn deliver(barrack: &Place<Worker>, worker: Worker, ledger: &FlowLedger) {
    if barrack.add(worker) == Admission::Discarded {
        ledger.record_death();
    }
    ledger.end_transit(1);
}

/// Take one reserved worker out of `barrack`, marking it in transit.
///
/// On a miss the reservation is released and the transit closed again.
fn take_worker(barrack: &Place<Worker>, ledger: &FlowLedger) -> Option<Worker> {
    ledger.begin_transit(1);
    let worker = barrack.get();
    if worker.is_none() {
        barrack.unreserve();
        ledger.end_transit(1);
    }
    worker
}

/// Worker -> worker (maybe injured) + food of random quality.
fn field<R: Rng + ?Sized>(
    input: &Place<Worker>,
    output: &Place<Worker>,
    barn: &Place<Food>,
    ctx: &CycleContext<'_>,
    rng: &mut R,
) -> Cycle {
    if !input.reserve() {
        return Cycle::Starved;
    }
    let Some(mut worker) = take_worker(input, ctx.ledger) else {
        return Cycle::Starved;
    };
    worker.change_vitality(vitals::field_injury(rng, ctx.config));
    let food = Food::new(rng.random::<f64>());
    deliver(output, worker, ctx.ledger);
    barn.add(food);
    ctx.ledger.record_food_produced();
    Cycle::Fired
}

/// Worker + food -> worker whose vitality follows the food's quality.
fn dining_hall(
    input: &Place<Worker>,
    output: &Place<Worker>,
    barn: &Place<Food>,
    ctx: &CycleContext<'_>,
) -> Cycle {
    if !input.reserve() {
        return Cycle::Starved;
    }
    if !barn.reserve() {
        input.unreserve();
        return Cycle::Starved;
    }
    let Some(mut worker) = take_worker(input, ctx.ledger) else {
        barn.unreserve();
        return Cycle::Starved;
    };
    let Some(food) = barn.get() else {
        // The reservation guaranteed a token; return the worker untouched.
        deliver(input, worker, ctx.ledger);
        return Cycle::Starved;
    };
    ctx.ledger.record_food_eaten();
    worker.change_vitality(vitals::dining_gain(food.quality(), ctx.config));
    deliver(output, worker, ctx.ledger);
    Cycle::Fired
}

/// Product + worker -> rested worker, or product + two workers -> the same
/// two workers plus a newborn.
fn home<R: Rng + ?Sized>(
    input: &Place<Worker>,
    output: &Place<Worker>,
    storage: &Place<Product>,
    priority: f64,
    ctx: &CycleContext<'_>,
    rng: &mut R,
) -> Cycle {
    if !storage.reserve() {
        return Cycle::Starved;
    }
    if !input.reserve() {
        storage.unreserve();
        return Cycle::Starved;
    }
    let pair = rng.random_bool(probability(1.0 - priority)) && input.reserve();

    let Some(first) = take_worker(input, ctx.ledger) else {
        storage.unreserve();
        if pair {
            input.unreserve();
        }
        return Cycle::Starved;
    };
    let second = if pair {
        take_worker(input, ctx.ledger)
    } else {
        None
    };
    let Some(Product) = storage.get() else {
        deliver(input, first, ctx.ledger);
        if let Some(second) = second {
            deliver(input, second, ctx.ledger);
        }
        return Cycle::Starved;
    };
    ctx.ledger.record_product_consumed();

    match second {
        Some(second) => {
            deliver(output, first, ctx.ledger);
            deliver(output, second, ctx.ledger);
            output.add(Worker::new());
            ctx.ledger.record_birth();
        }
        None => {
            let mut worker = first;
            worker.change_vitality(vitals::rest_gain(rng, ctx.config));
            deliver(output, worker, ctx.ledger);
        }
    }
    Cycle::Fired
}

/// Worker -> worn worker + product.
fn factory<R: Rng + ?Sized>(
    input: &Place<Worker>,
    output: &Place<Worker>,
    storage: &Place<Product>,
    harm_level: u8,
    ctx: &CycleContext<'_>,
    rng: &mut R,
) -> Cycle {
    if !input.reserve() {
        return Cycle::Starved;
    }
    let Some(mut worker) = take_worker(input, ctx.ledger) else {
        return Cycle::Starved;
    };
    let r = rng.random::<f64>();
    worker.change_vitality(vitals::factory_wear(r, harm_level, ctx.config));
    storage.add(Product);
    ctx.ledger.record_product_made();
    deliver(output, worker, ctx.ledger);
    Cycle::Fired
}
