//! A thread-safe resource pool with a two-phase reservation protocol.
//!
//! A transition that needs tokens from several places first reserves one
//! token in each, and only retrieves once every reservation has succeeded.
//! If a later reservation fails, the earlier ones are released with
//! [`Place::unreserve`] and nothing is retrieved. Because a reservation only
//! succeeds while `stored - reserved > 0`, a reserved token is guaranteed to
//! still be there when its holder calls [`Place::get`].
//!
//! Each place owns its own lock. No operation here takes a second lock, and
//! the event sink is invoked under the place lock so events from one place
//! are delivered in mutation order.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use simsims_types::{
    Discipline, PlaceChange, PlaceEvent, PlaceId, PlaceKind, ResourceState, Token,
};
use tracing::trace;

use crate::events::EventSink;

/// Result of offering a token to a place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The token was stored.
    Stored,
    /// The token was dropped (a dead worker offered to a barrack).
    Discarded,
}

/// Mutable state guarded by the place lock.
#[derive(Debug)]
struct PlaceState<T> {
    stored: VecDeque<T>,
    reserved: usize,
}

impl<T> PlaceState<T> {
    fn available(&self) -> usize {
        self.stored.len().saturating_sub(self.reserved)
    }
}

/// A pool of tokens of one kind.
///
/// Barracks and barns serve the oldest token first, storages the newest.
pub struct Place<T: Token> {
    id: PlaceId,
    discipline: Discipline,
    state: Mutex<PlaceState<T>>,
    sink: Arc<dyn EventSink>,
}

impl<T: Token> Place<T> {
    /// Create an empty place at `index` in the arena of its kind.
    ///
    /// The place kind follows from the token type, so a barrack can only
    /// ever hold workers.
    pub fn new(index: usize, sink: Arc<dyn EventSink>) -> Self {
        let kind = PlaceKind::for_resource(T::KIND);
        Self {
            id: PlaceId::new(kind, index),
            discipline: kind.discipline(),
            state: Mutex::new(PlaceState {
                stored: VecDeque::new(),
                reserved: 0,
            }),
            sink,
        }
    }

    /// The arena address of this place.
    pub const fn id(&self) -> PlaceId {
        self.id
    }

    /// The kind of this place.
    pub const fn kind(&self) -> PlaceKind {
        self.id.kind
    }

    /// Claim one unreserved token for a later [`get`](Self::get).
    ///
    /// Returns `false` without side effects when every stored token is
    /// already reserved.
    pub fn reserve(&self) -> bool {
        let mut state = self.lock();
        if state.available() == 0 {
            return false;
        }
        state.reserved = state.reserved.saturating_add(1);
        trace!(place = %self.id, reserved = state.reserved, "Reserved");
        true
    }

    /// Release a reservation that will not be followed by a `get`.
    ///
    /// Does nothing when no reservation is outstanding.
    pub fn unreserve(&self) {
        let mut state = self.lock();
        state.reserved = state.reserved.saturating_sub(1);
        trace!(place = %self.id, reserved = state.reserved, "Unreserved");
    }

    /// Remove one token according to the place's discipline.
    ///
    /// Consumes one outstanding reservation if there is one. Calling without
    /// a reservation is tolerated and returns `None` when the place is empty.
    pub fn get(&self) -> Option<T> {
        let mut state = self.lock();
        let token = match self.discipline {
            Discipline::Fifo => state.stored.pop_front(),
            Discipline::Lifo => state.stored.pop_back(),
        }?;
        state.reserved = state.reserved.saturating_sub(1);
        self.emit(PlaceChange::Removed, token.state(), state.stored.len());
        Some(token)
    }

    /// Store a token.
    ///
    /// A token that is no longer alive (a worker at zero vitality) is dropped
    /// here instead, and reported as [`Admission::Discarded`].
    pub fn add(&self, token: T) -> Admission {
        let mut state = self.lock();
        if !token.is_alive() {
            self.emit(PlaceChange::Discarded, token.state(), state.stored.len());
            return Admission::Discarded;
        }
        let resource = token.state();
        state.stored.push_back(token);
        self.emit(PlaceChange::Added, resource, state.stored.len());
        Admission::Stored
    }

    /// Number of stored tokens, reserved or not.
    pub fn len(&self) -> usize {
        self.lock().stored.len()
    }

    /// Whether the place stores no tokens at all.
    pub fn is_empty(&self) -> bool {
        self.lock().stored.is_empty()
    }

    /// Number of stored tokens not yet claimed by a reservation.
    pub fn available(&self) -> usize {
        self.lock().available()
    }

    /// Number of outstanding reservations.
    pub fn reserved(&self) -> usize {
        self.lock().reserved
    }

    fn lock(&self) -> MutexGuard<'_, PlaceState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, change: PlaceChange, resource: ResourceState, stored: usize) {
        self.sink.on_event(&PlaceEvent {
            place: self.id,
            change,
            resource,
            stored,
        });
        trace!(place = %self.id, ?change, stored, "Place changed");
    }
}

impl<T: Token> core::fmt::Debug for Place<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.lock();
        f.debug_struct("Place")
            .field("id", &self.id)
            .field("stored", &state.stored.len())
            .field("reserved", &state.reserved)
            .finish_non_exhaustive()
    }
}

impl<T: Token> core::fmt::Display for Place<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}[{}]", self.id, self.len())
    }
}
