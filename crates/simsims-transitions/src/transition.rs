//! Runtime state of one transition actor.
//!
//! A [`Transition`] is shared between its own actor thread and the
//! stabilizer. The stabilizer may close or reopen it, nudge a home's
//! priority, and rebind any of its three places while the actor runs. Each
//! of those is an independent atomic or short-locked update; the actor copies
//! its bindings once at the start of every cycle, so a rebind takes effect on
//! the next cycle and never splits a reservation from its retrieval.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use simsims_types::{PlaceId, PlaceKind, Port, TransitionId, TransitionKind};
use simsims_world::{PlaceArena, WorldError};

/// The three places a transition is bound to, as arena indices.
///
/// Every kind has an input and an output barrack; `other` is the barn or
/// storage named by [`TransitionKind::other_binding`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bindings {
    /// Index of the barrack workers are taken from.
    pub barrack_in: usize,
    /// Index of the barrack workers are returned to.
    pub barrack_out: usize,
    /// Index of the barn or storage.
    pub other: usize,
}

/// One of the three binding positions of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// The input barrack.
    BarrackIn,
    /// The output barrack.
    BarrackOut,
    /// The barn or storage.
    Other,
}

impl Slot {
    /// Every slot, in binding order.
    pub const ALL: [Self; 3] = [Self::BarrackIn, Self::BarrackOut, Self::Other];

    /// The place kind this slot accepts on a transition of `kind`.
    pub const fn place_kind(self, kind: TransitionKind) -> PlaceKind {
        match self {
            Self::BarrackIn | Self::BarrackOut => PlaceKind::Barrack,
            Self::Other => kind.other_binding().0,
        }
    }

    /// Whether this slot is read from or written to on a transition of
    /// `kind`.
    pub const fn port(self, kind: TransitionKind) -> Port {
        match self {
            Self::BarrackIn => Port::Input,
            Self::BarrackOut => Port::Output,
            Self::Other => kind.other_binding().1,
        }
    }
}

/// A home's reproduction priority in `[0, 1]`, stored as `f64` bits.
#[derive(Debug)]
pub struct Priority(AtomicU64);

impl Priority {
    fn new(value: f64) -> Self {
        Self(AtomicU64::new(clamp_unit(value).to_bits()))
    }

    /// Current value.
    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }

    fn set(&self, value: f64) {
        self.0.store(clamp_unit(value).to_bits(), Ordering::Release);
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

/// Per-kind rule state.
#[derive(Debug)]
pub enum Rule {
    /// Worker -> worker + food.
    Field,
    /// Worker + food -> worker.
    DiningHall,
    /// Worker(s) + product -> rested worker, or two workers + a newborn.
    Home {
        /// Reproduction is attempted with probability `1 - priority`.
        priority: Priority,
    },
    /// Worker -> worker + product.
    Factory {
        /// Fixed extra wear in `[0, 10)`, drawn at construction.
        harm_level: u8,
    },
}

impl Rule {
    /// Rule state for a home with the given starting priority.
    pub fn home(priority: f64) -> Self {
        Self::Home {
            priority: Priority::new(priority),
        }
    }

    /// The transition kind this rule implements.
    pub const fn kind(&self) -> TransitionKind {
        match self {
            Self::Field => TransitionKind::Field,
            Self::DiningHall => TransitionKind::DiningHall,
            Self::Home { .. } => TransitionKind::Home,
            Self::Factory { .. } => TransitionKind::Factory,
        }
    }
}

/// A transition actor's shared state.
#[derive(Debug)]
pub struct Transition {
    id: TransitionId,
    rule: Rule,
    closed: AtomicBool,
    bindings: Mutex<Bindings>,
}

impl Transition {
    /// Create a running transition.
    ///
    /// # Errors
    ///
    /// Returns a [`WorldError`] if any binding does not address a place of
    /// the kind its slot requires.
    pub fn new(
        index: usize,
        rule: Rule,
        bindings: Bindings,
        arena: &PlaceArena,
    ) -> Result<Self, WorldError> {
        let kind = rule.kind();
        for slot in Slot::ALL {
            let id = PlaceId::new(slot.place_kind(kind), slot_index(&bindings, slot));
            arena.check(id, slot.place_kind(kind))?;
        }
        Ok(Self {
            id: TransitionId::new(kind, index),
            rule,
            closed: AtomicBool::new(false),
            bindings: Mutex::new(bindings),
        })
    }

    /// This transition's identifier.
    pub const fn id(&self) -> TransitionId {
        self.id
    }

    /// This transition's kind.
    pub const fn kind(&self) -> TransitionKind {
        self.id.kind
    }

    /// The rule state.
    pub const fn rule(&self) -> &Rule {
        &self.rule
    }

    /// Whether the stabilizer has paused this transition.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Close or reopen. Returns the previous state.
    pub fn set_closed(&self, closed: bool) -> bool {
        self.closed.swap(closed, Ordering::AcqRel)
    }

    /// A home's current priority; `None` for other kinds.
    pub fn priority(&self) -> Option<f64> {
        match &self.rule {
            Rule::Home { priority } => Some(priority.get()),
            _ => None,
        }
    }

    /// Shift a home's priority by `delta`, clamped to `[0, 1]`.
    ///
    /// Returns the new priority, or `None` for other kinds.
    pub fn nudge_priority(&self, delta: f64) -> Option<f64> {
        match &self.rule {
            Rule::Home { priority } => {
                priority.set(priority.get() + delta);
                Some(priority.get())
            }
            _ => None,
        }
    }

    /// A factory's fixed harm level; `None` for other kinds.
    pub const fn harm_level(&self) -> Option<u8> {
        match self.rule {
            Rule::Factory { harm_level } => Some(harm_level),
            _ => None,
        }
    }

    /// A copy of the current bindings.
    pub fn bindings(&self) -> Bindings {
        *self
            .bindings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// The place bound to `slot`.
    pub fn place(&self, slot: Slot) -> PlaceId {
        PlaceId::new(slot.place_kind(self.kind()), slot_index(&self.bindings(), slot))
    }

    /// Rebind `slot` to `target`. Returns the place it was bound to before.
    ///
    /// The running cycle keeps its own copy of the bindings; the change is
    /// picked up by the next cycle.
    ///
    /// # Errors
    ///
    /// Returns a [`WorldError`] if `target` is not a place of the kind the
    /// slot requires.
    pub fn rebind(
        &self,
        slot: Slot,
        target: PlaceId,
        arena: &PlaceArena,
    ) -> Result<PlaceId, WorldError> {
        let kind = slot.place_kind(self.kind());
        arena.check(target, kind)?;
        let mut bindings = self
            .bindings
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let index = match slot {
            Slot::BarrackIn => &mut bindings.barrack_in,
            Slot::BarrackOut => &mut bindings.barrack_out,
            Slot::Other => &mut bindings.other,
        };
        let previous = core::mem::replace(index, target.index);
        Ok(PlaceId::new(kind, previous))
    }
}

const fn slot_index(bindings: &Bindings, slot: Slot) -> usize {
    match slot {
        Slot::BarrackIn => bindings.barrack_in,
        Slot::BarrackOut => bindings.barrack_out,
        Slot::Other => bindings.other,
    }
}

impl core::fmt::Display for Transition {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.id)
    }
}
