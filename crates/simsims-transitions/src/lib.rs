//! Transition actors for the SimSims simulation.
//!
//! A transition is a production rule bound to three places: an input
//! barrack, an output barrack, and one barn or storage. Each transition runs
//! on its own thread, repeating reserve -> retrieve -> transform -> write back
//! until the run's stop signal is raised.
//!
//! # Modules
//!
//! - [`config`] -- [`RuleConfig`] tunables for rules and actor pacing.
//! - [`vitals`] -- Vitality formulas: field injuries, the dining curve, rest
//!   gains, and factory wear.
//! - [`transition`] -- [`Transition`] shared state: closed flag, home
//!   priority, and rewireable [`Bindings`].
//! - [`rules`] -- The four production rules and [`fire`].
//! - [`actor`] -- The per-thread [`run_actor`] loop and the [`Halt`] seam.

pub mod actor;
pub mod config;
pub mod rules;
pub mod transition;
pub mod vitals;

// Re-export primary types at crate root.
pub use actor::{ActorState, ActorSummary, Halt, run_actor};
pub use config::RuleConfig;
pub use rules::{Cycle, CycleContext, fire};
pub use transition::{Bindings, Priority, Rule, Slot, Transition};
