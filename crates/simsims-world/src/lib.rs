//! Resource pools and flow accounting for the SimSims simulation.
//!
//! This crate models the shared mutable state every transition competes for:
//! typed places with a two-phase reservation protocol, the arena that owns
//! them for the whole run, the event boundary through which places report
//! their mutations, and the ledger that tallies every token created or
//! destroyed.
//!
//! # Modules
//!
//! - [`place`] -- [`Place`] with `reserve` / `unreserve` / `get` / `add` and
//!   FIFO or LIFO retrieval by place kind.
//! - [`arena`] -- [`PlaceArena`], lookups by [`PlaceId`], load queries for
//!   rewiring, and stock totals.
//! - [`events`] -- The [`EventSink`] trait and the stock sinks.
//! - [`ledger`] -- [`FlowLedger`] counters, in-transit tracking, and the
//!   conservation check.
//! - [`error`] -- Error types for world construction and execution.
//!
//! [`PlaceId`]: simsims_types::PlaceId

pub mod arena;
pub mod error;
pub mod events;
pub mod ledger;
pub mod place;

// Re-export primary types at crate root.
pub use arena::{PlaceArena, PlaceCounts, Stock};
pub use error::WorldError;
pub use events::{ChannelSink, EventSink, NoOpSink};
pub use ledger::{ConservationResult, FlowLedger, Imbalance, LedgerTotals};
pub use place::{Admission, Place};
