//! Token types and the value records emitted to external collaborators.
//!
//! [`Worker`], [`Food`], and [`Product`] are deliberately move-only: a token
//! lives in exactly one place (or in exactly one transition mid-cycle) and is
//! handed over by value. Anything that needs to describe a token without
//! owning it uses the copyable [`ResourceState`].

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{PlaceChange, ResourceKind};
use crate::ids::{PlaceId, RunId};

/// Upper bound of a worker's vitality. New workers start here.
pub const MAX_VITALITY: u8 = 100;

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// Behaviour shared by every token type a place can hold.
pub trait Token: Send + 'static {
    /// The resource kind of this token type.
    const KIND: ResourceKind;

    /// A copy of the token's payload for events.
    fn state(&self) -> ResourceState;

    /// Whether the token may be stored. Only dead workers answer `false`.
    fn is_alive(&self) -> bool {
        true
    }
}

/// A worker. Dead once vitality reaches 0.
#[derive(Debug, PartialEq, Eq)]
pub struct Worker {
    vitality: u8,
}

impl Worker {
    /// A newborn worker at full vitality.
    pub const fn new() -> Self {
        Self {
            vitality: MAX_VITALITY,
        }
    }

    /// A worker with the given vitality, clamped to `[0, 100]`.
    pub fn with_vitality(vitality: i32) -> Self {
        let mut worker = Self { vitality: 0 };
        worker.change_vitality(vitality);
        worker
    }

    /// Current vitality in `[0, 100]`.
    pub const fn vitality(&self) -> u8 {
        self.vitality
    }

    /// Apply a signed vitality change, clamping the result to `[0, 100]`.
    ///
    /// Returns the new vitality.
    pub fn change_vitality(&mut self, change: i32) -> u8 {
        let raw = i32::from(self.vitality)
            .saturating_add(change)
            .clamp(0, i32::from(MAX_VITALITY));
        self.vitality = u8::try_from(raw).unwrap_or(0);
        self.vitality
    }
}

impl Default for Worker {
    fn default() -> Self {
        Self::new()
    }
}

impl Token for Worker {
    const KIND: ResourceKind = ResourceKind::Worker;

    fn state(&self) -> ResourceState {
        ResourceState::Worker {
            vitality: self.vitality,
        }
    }

    fn is_alive(&self) -> bool {
        self.vitality > 0
    }
}

impl core::fmt::Display for Worker {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Worker({})", self.vitality)
    }
}

/// Food with a quality in `[0, 1)`.
#[derive(Debug, PartialEq)]
pub struct Food {
    quality: f64,
}

impl Food {
    /// Create food, clamping `quality` into `[0, 1)`. NaN becomes 0.
    pub fn new(quality: f64) -> Self {
        let quality = if quality.is_nan() {
            0.0
        } else {
            quality.clamp(0.0, 1.0 - f64::EPSILON)
        };
        Self { quality }
    }

    /// The food's quality.
    pub const fn quality(&self) -> f64 {
        self.quality
    }
}

impl Token for Food {
    const KIND: ResourceKind = ResourceKind::Food;

    fn state(&self) -> ResourceState {
        ResourceState::Food {
            quality: self.quality,
        }
    }
}

/// A manufactured product. Carries no payload.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Product;

impl Token for Product {
    const KIND: ResourceKind = ResourceKind::Product;

    fn state(&self) -> ResourceState {
        ResourceState::Product
    }
}

/// Copyable description of a token: its kind and payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ResourceState {
    /// A worker and its vitality.
    Worker {
        /// Vitality at the time of the event.
        vitality: u8,
    },
    /// Food and its quality.
    Food {
        /// Quality in `[0, 1)`.
        quality: f64,
    },
    /// A product.
    Product,
}

impl ResourceState {
    /// The kind of the described token.
    pub const fn kind(&self) -> ResourceKind {
        match self {
            Self::Worker { .. } => ResourceKind::Worker,
            Self::Food { .. } => ResourceKind::Food,
            Self::Product => ResourceKind::Product,
        }
    }
}

// ---------------------------------------------------------------------------
// External records
// ---------------------------------------------------------------------------

/// A token entered, left, or was refused by a place.
///
/// Emitted synchronously with the mutation it describes, in the order the
/// place applied the mutations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlaceEvent {
    /// The place that changed.
    pub place: PlaceId,
    /// What happened.
    pub change: PlaceChange,
    /// The token involved.
    pub resource: ResourceState,
    /// Number of tokens stored after the change.
    pub stored: usize,
}

/// Periodic population sample handed to the analytics collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PopulationSnapshot {
    /// The run this sample belongs to.
    pub run_id: RunId,
    /// Milliseconds since the run started.
    pub elapsed_ms: u64,
    /// Workers stored across all barracks.
    pub total_workers: usize,
    /// Products stored across all storages.
    pub total_products: usize,
    /// Food stored across all barns.
    pub total_food: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::PlaceKind;

    #[test]
    fn new_worker_has_full_vitality() {
        let worker = Worker::new();
        assert_eq!(worker.vitality(), MAX_VITALITY);
        assert!(worker.is_alive());
    }

    #[test]
    fn vitality_clamped_at_both_ends() {
        let mut worker = Worker::new();
        assert_eq!(worker.change_vitality(40), 100);
        assert_eq!(worker.change_vitality(-250), 0);
        assert!(!worker.is_alive());
        assert_eq!(worker.change_vitality(i32::MAX), 100);
        assert_eq!(worker.change_vitality(i32::MIN), 0);
    }

    #[test]
    fn vitality_clamp_holds_for_any_sequence() {
        let changes = [-80, 35, 12, -3, 99, -100, 100, 7, -1, -64, 250, -250];
        let mut worker = Worker::with_vitality(55);
        for change in changes {
            let v = worker.change_vitality(change);
            assert!(v <= MAX_VITALITY);
        }
    }

    #[test]
    fn with_vitality_clamps() {
        assert_eq!(Worker::with_vitality(-5).vitality(), 0);
        assert_eq!(Worker::with_vitality(250).vitality(), 100);
        assert_eq!(Worker::with_vitality(42).vitality(), 42);
    }

    #[test]
    fn food_quality_stays_below_one() {
        assert!(Food::new(1.0).quality() < 1.0);
        assert!(Food::new(7.5).quality() < 1.0);
        assert!(Food::new(-0.3).quality() >= 0.0);
        assert!(Food::new(f64::NAN).quality() >= 0.0);
    }

    #[test]
    fn token_states_report_kind() {
        assert_eq!(Worker::new().state().kind(), ResourceKind::Worker);
        assert_eq!(Food::new(0.5).state().kind(), ResourceKind::Food);
        assert_eq!(Product.state().kind(), ResourceKind::Product);
    }

    #[test]
    fn place_event_round_trips_through_json() {
        let event = PlaceEvent {
            place: PlaceId::new(PlaceKind::Barrack, 0),
            change: PlaceChange::Discarded,
            resource: ResourceState::Worker { vitality: 0 },
            stored: 4,
        };
        let json = serde_json::to_string(&event).unwrap_or_default();
        assert!(json.contains(r#""kind":"worker""#));
        let back: Result<PlaceEvent, _> = serde_json::from_str(&json);
        assert_eq!(back.ok(), Some(event));
    }
}
