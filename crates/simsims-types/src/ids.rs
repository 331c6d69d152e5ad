//! Identifiers for runs, places, and transitions.
//!
//! A run is identified by a UUID v7 so snapshots from different runs can be
//! grouped by an analytics consumer. Places and transitions live in
//! world-owned arenas for the whole run, so they are addressed by a kind tag
//! plus an index into that arena. Rewiring a transition is an index swap.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::enums::{PlaceKind, TransitionKind};

/// Unique identifier for one simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RunId(pub Uuid);

impl RunId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for RunId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generates an arena address: a kind tag plus an index within that kind.
macro_rules! define_slot_id {
    (
        $(#[$meta:meta])*
        $name:ident($kind:ty)
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name {
            /// Which arena the slot belongs to.
            pub kind: $kind,
            /// Position within that arena.
            pub index: usize,
        }

        impl $name {
            /// Build an identifier from its kind and arena index.
            pub const fn new(kind: $kind, index: usize) -> Self {
                Self { kind, index }
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}#{}", self.kind, self.index)
            }
        }
    };
}

define_slot_id! {
    /// Address of a place (Barrack, Barn, or Storage) in the place arena.
    PlaceId(PlaceKind)
}

define_slot_id! {
    /// Address of a transition actor in the world's transition list.
    TransitionId(TransitionKind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_ids_are_unique() {
        let a = RunId::new();
        let b = RunId::new();
        assert_ne!(a, b);
        assert_ne!(a.into_inner(), Uuid::nil());
    }

    #[test]
    fn place_id_display_names_kind_and_index() {
        let id = PlaceId::new(PlaceKind::Barrack, 3);
        assert_eq!(id.to_string(), "Barrack#3");
    }

    #[test]
    fn transition_id_display_names_kind_and_index() {
        let id = TransitionId::new(TransitionKind::DiningHall, 0);
        assert_eq!(id.to_string(), "DiningHall#0");
    }

    #[test]
    fn place_id_serializes_as_object() {
        let id = PlaceId::new(PlaceKind::Storage, 1);
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, r#"{"kind":"storage","index":1}"#);
    }
}
