//! Enumeration types for the SimSims simulation.
//!
//! The set of token, place, and transition kinds is closed: every rule in
//! the simulation is expressed over exactly these variants, so they are plain
//! sum types rather than open trait hierarchies.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// The type of a token flowing through the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ResourceKind {
    /// A worker with a vitality score.
    Worker,
    /// Food with a quality score.
    Food,
    /// A manufactured product.
    Product,
}

// ---------------------------------------------------------------------------
// Places
// ---------------------------------------------------------------------------

/// Retrieval order of a place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Discipline {
    /// Oldest token is served first.
    Fifo,
    /// Most recently added token is served first.
    Lifo,
}

/// The kind of a resource pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum PlaceKind {
    /// Holds workers. FIFO.
    Barrack,
    /// Holds food. FIFO.
    Barn,
    /// Holds products. LIFO.
    Storage,
}

impl PlaceKind {
    /// All place kinds, in arena order.
    pub const ALL: [Self; 3] = [Self::Barrack, Self::Barn, Self::Storage];

    /// The retrieval discipline of this kind of place.
    ///
    /// Storages hand out their newest product first; everything else is
    /// served oldest-first.
    pub const fn discipline(self) -> Discipline {
        match self {
            Self::Barrack | Self::Barn => Discipline::Fifo,
            Self::Storage => Discipline::Lifo,
        }
    }

    /// The only resource kind this place may hold.
    pub const fn resource_kind(self) -> ResourceKind {
        match self {
            Self::Barrack => ResourceKind::Worker,
            Self::Barn => ResourceKind::Food,
            Self::Storage => ResourceKind::Product,
        }
    }

    /// The place kind that stores `resource`.
    pub const fn for_resource(resource: ResourceKind) -> Self {
        match resource {
            ResourceKind::Worker => Self::Barrack,
            ResourceKind::Food => Self::Barn,
            ResourceKind::Product => Self::Storage,
        }
    }
}

impl core::fmt::Display for PlaceKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Barrack => write!(f, "Barrack"),
            Self::Barn => write!(f, "Barn"),
            Self::Storage => write!(f, "Storage"),
        }
    }
}

/// A change applied to a place, reported through place events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum PlaceChange {
    /// A token was stored.
    Added,
    /// A token was retrieved.
    Removed,
    /// A token was offered but not stored (a dead worker at a barrack).
    Discarded,
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// Which side of a transition a binding sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Port {
    /// The transition retrieves from this place.
    Input,
    /// The transition writes to this place.
    Output,
}

/// The production rule a transition implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum TransitionKind {
    /// Worker -> worker + food.
    Field,
    /// Worker + food -> worker.
    DiningHall,
    /// Worker(s) + product -> rested worker, or two workers + a newborn.
    Home,
    /// Worker -> worker + product.
    Factory,
}

impl TransitionKind {
    /// All transition kinds, in wiring order.
    pub const ALL: [Self; 4] = [Self::DiningHall, Self::Home, Self::Field, Self::Factory];

    /// The non-barrack place this kind is bound to, and on which side.
    ///
    /// Every transition also has one input and one output barrack.
    pub const fn other_binding(self) -> (PlaceKind, Port) {
        match self {
            Self::Field => (PlaceKind::Barn, Port::Output),
            Self::DiningHall => (PlaceKind::Barn, Port::Input),
            Self::Home => (PlaceKind::Storage, Port::Input),
            Self::Factory => (PlaceKind::Storage, Port::Output),
        }
    }
}

impl core::fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Field => write!(f, "Field"),
            Self::DiningHall => write!(f, "DiningHall"),
            Self::Home => write!(f, "Home"),
            Self::Factory => write!(f, "Factory"),
        }
    }
}

// ---------------------------------------------------------------------------
// Run lifecycle
// ---------------------------------------------------------------------------

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EndReason {
    /// Every barrack was empty and no worker was in transit.
    BarracksEmpty,
    /// The wall-clock budget elapsed.
    BudgetElapsed,
    /// An external caller requested the stop.
    ExternalStop,
}

impl core::fmt::Display for EndReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::BarracksEmpty => write!(f, "barracks_empty"),
            Self::BudgetElapsed => write!(f, "budget_elapsed"),
            Self::ExternalStop => write!(f, "external_stop"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_is_the_only_lifo_place() {
        assert_eq!(PlaceKind::Barrack.discipline(), Discipline::Fifo);
        assert_eq!(PlaceKind::Barn.discipline(), Discipline::Fifo);
        assert_eq!(PlaceKind::Storage.discipline(), Discipline::Lifo);
    }

    #[test]
    fn place_kinds_hold_one_resource_kind() {
        assert_eq!(PlaceKind::Barrack.resource_kind(), ResourceKind::Worker);
        assert_eq!(PlaceKind::Barn.resource_kind(), ResourceKind::Food);
        assert_eq!(PlaceKind::Storage.resource_kind(), ResourceKind::Product);
        for kind in PlaceKind::ALL {
            assert_eq!(PlaceKind::for_resource(kind.resource_kind()), kind);
        }
    }

    #[test]
    fn other_bindings_match_production_rules() {
        assert_eq!(
            TransitionKind::Field.other_binding(),
            (PlaceKind::Barn, Port::Output)
        );
        assert_eq!(
            TransitionKind::DiningHall.other_binding(),
            (PlaceKind::Barn, Port::Input)
        );
        assert_eq!(
            TransitionKind::Home.other_binding(),
            (PlaceKind::Storage, Port::Input)
        );
        assert_eq!(
            TransitionKind::Factory.other_binding(),
            (PlaceKind::Storage, Port::Output)
        );
    }

    #[test]
    fn end_reason_serializes_snake_case() {
        let json = serde_json::to_string(&EndReason::BudgetElapsed).unwrap_or_default();
        assert_eq!(json, r#""budget_elapsed""#);
    }
}
