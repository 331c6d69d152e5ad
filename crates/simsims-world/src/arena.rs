//! The world-owned arena of places.
//!
//! Places are allocated once, at construction, and live for the whole run.
//! Transitions refer to them by [`PlaceId`] (kind plus index), so rewiring a
//! transition never touches the places themselves.

use std::sync::Arc;

use simsims_types::{Food, PlaceId, PlaceKind, Product, Worker};

use crate::error::WorldError;
use crate::events::EventSink;
use crate::place::Place;

/// How many places of each kind to allocate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceCounts {
    /// Number of barracks.
    pub barracks: usize,
    /// Number of storages.
    pub storages: usize,
    /// Number of barns.
    pub barns: usize,
}

/// Totals across every place of each kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stock {
    /// Workers stored in barracks.
    pub workers: usize,
    /// Food stored in barns.
    pub food: usize,
    /// Products stored in storages.
    pub products: usize,
}

/// Every place in the world, grouped by kind.
#[derive(Debug)]
pub struct PlaceArena {
    barracks: Vec<Place<Worker>>,
    barns: Vec<Place<Food>>,
    storages: Vec<Place<Product>>,
}

impl PlaceArena {
    /// Allocate empty places.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Unwireable`] if any place kind has no instances,
    /// since every transition needs a barrack plus a barn or storage.
    pub fn new(counts: PlaceCounts, sink: &Arc<dyn EventSink>) -> Result<Self, WorldError> {
        if counts.barracks == 0 || counts.storages == 0 || counts.barns == 0 {
            return Err(WorldError::Unwireable {
                barracks: counts.barracks,
                storages: counts.storages,
                barns: counts.barns,
            });
        }
        Ok(Self {
            barracks: (0..counts.barracks)
                .map(|i| Place::new(i, Arc::clone(sink)))
                .collect(),
            barns: (0..counts.barns)
                .map(|i| Place::new(i, Arc::clone(sink)))
                .collect(),
            storages: (0..counts.storages)
                .map(|i| Place::new(i, Arc::clone(sink)))
                .collect(),
        })
    }

    /// The barrack at `index`, if any.
    pub fn barrack(&self, index: usize) -> Option<&Place<Worker>> {
        self.barracks.get(index)
    }

    /// The barn at `index`, if any.
    pub fn barn(&self, index: usize) -> Option<&Place<Food>> {
        self.barns.get(index)
    }

    /// The storage at `index`, if any.
    pub fn storage(&self, index: usize) -> Option<&Place<Product>> {
        self.storages.get(index)
    }

    /// All barracks.
    pub fn barracks(&self) -> &[Place<Worker>] {
        &self.barracks
    }

    /// All barns.
    pub fn barns(&self) -> &[Place<Food>] {
        &self.barns
    }

    /// All storages.
    pub fn storages(&self) -> &[Place<Product>] {
        &self.storages
    }

    /// Number of places of `kind`.
    pub fn count(&self, kind: PlaceKind) -> usize {
        match kind {
            PlaceKind::Barrack => self.barracks.len(),
            PlaceKind::Barn => self.barns.len(),
            PlaceKind::Storage => self.storages.len(),
        }
    }

    /// Whether `id` addresses a place in this arena.
    pub fn contains(&self, id: PlaceId) -> bool {
        id.index < self.count(id.kind)
    }

    /// Check that `id` addresses a place of `expected` kind.
    ///
    /// # Errors
    ///
    /// [`WorldError::KindMismatch`] for the wrong kind,
    /// [`WorldError::PlaceNotFound`] for an index out of range.
    pub fn check(&self, id: PlaceId, expected: PlaceKind) -> Result<(), WorldError> {
        if id.kind != expected {
            return Err(WorldError::KindMismatch {
                place: id,
                expected,
            });
        }
        if !self.contains(id) {
            return Err(WorldError::PlaceNotFound(id));
        }
        Ok(())
    }

    /// Stored token count of the place at `id`.
    pub fn load(&self, id: PlaceId) -> Option<usize> {
        match id.kind {
            PlaceKind::Barrack => self.barrack(id.index).map(Place::len),
            PlaceKind::Barn => self.barn(id.index).map(Place::len),
            PlaceKind::Storage => self.storage(id.index).map(Place::len),
        }
    }

    /// Stored token counts of every place of `kind`, by index.
    pub fn loads(&self, kind: PlaceKind) -> Vec<usize> {
        match kind {
            PlaceKind::Barrack => self.barracks.iter().map(Place::len).collect(),
            PlaceKind::Barn => self.barns.iter().map(Place::len).collect(),
            PlaceKind::Storage => self.storages.iter().map(Place::len).collect(),
        }
    }

    /// The place of `kind` holding the most tokens. Ties go to the lowest
    /// index.
    pub fn most_loaded(&self, kind: PlaceKind) -> Option<PlaceId> {
        let loads = self.loads(kind);
        let (index, _) = loads
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, usize)>, (i, &load)| match best {
                Some((_, top)) if top >= load => best,
                _ => Some((i, load)),
            })?;
        Some(PlaceId::new(kind, index))
    }

    /// The place of `kind` holding the fewest tokens. Ties go to the lowest
    /// index.
    pub fn least_loaded(&self, kind: PlaceKind) -> Option<PlaceId> {
        let loads = self.loads(kind);
        let (index, _) = loads
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, usize)>, (i, &load)| match best {
                Some((_, low)) if low <= load => best,
                _ => Some((i, load)),
            })?;
        Some(PlaceId::new(kind, index))
    }

    /// Workers stored across every barrack.
    pub fn total_workers(&self) -> usize {
        self.barracks.iter().map(Place::len).sum()
    }

    /// Food stored across every barn.
    pub fn total_food(&self) -> usize {
        self.barns.iter().map(Place::len).sum()
    }

    /// Products stored across every storage.
    pub fn total_products(&self) -> usize {
        self.storages.iter().map(Place::len).sum()
    }

    /// Totals of all three kinds. Each place is read under its own lock, so
    /// the result is a sample, not an atomic cut.
    pub fn stock(&self) -> Stock {
        Stock {
            workers: self.total_workers(),
            food: self.total_food(),
            products: self.total_products(),
        }
    }

    /// Whether no barrack stores a worker.
    pub fn all_barracks_empty(&self) -> bool {
        self.barracks.iter().all(Place::is_empty)
    }
}
