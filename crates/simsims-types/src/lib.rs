//! Shared type definitions for the SimSims resource-flow simulation.
//!
//! This crate is the single source of truth for the values that cross crate
//! boundaries: tokens, kinds, identifiers, and the records emitted to the
//! visualization and analytics collaborators. Emitted records derive `ts-rs`
//! bindings so a front end can consume them without hand-written types.
//!
//! # Modules
//!
//! - [`ids`] -- Run identifier and arena addresses for places and transitions
//! - [`enums`] -- Resource, place, transition, and lifecycle enumerations
//! - [`structs`] -- Token types, [`ResourceState`], [`PlaceEvent`], and
//!   [`PopulationSnapshot`]
//!
//! [`ResourceState`]: structs::ResourceState
//! [`PlaceEvent`]: structs::PlaceEvent
//! [`PopulationSnapshot`]: structs::PopulationSnapshot

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{Discipline, EndReason, PlaceChange, PlaceKind, Port, ResourceKind, TransitionKind};
pub use ids::{PlaceId, RunId, TransitionId};
pub use structs::{
    Food, MAX_VITALITY, PlaceEvent, PopulationSnapshot, Product, ResourceState, Token, Worker,
};
