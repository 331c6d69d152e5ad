//! Creation and destruction tallies for every token kind.
//!
//! Tokens are created and destroyed only inside transitions (plus the initial
//! seeding of workers), and every such point reports here. At any quiescent
//! moment the stored stock must equal what the ledger says was created minus
//! what was destroyed:
//!
//! ```text
//! workers  = seeded + born - died        (plus any still in transit)
//! food     = produced - eaten
//! products = made - consumed
//! ```
//!
//! The ledger also tracks workers *in transit*: taken out of a barrack by a
//! transition and not yet written back or discarded. The termination watchdog
//! uses the in-transit count together with [`FlowLedger::transit_epoch`] to
//! tell "every barrack is empty" apart from "every worker is momentarily held
//! by a transition".

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use simsims_types::ResourceKind;

use crate::arena::Stock;

/// Lock-free counters shared by every transition thread.
#[derive(Debug, Default)]
pub struct FlowLedger {
    workers_seeded: AtomicU64,
    workers_born: AtomicU64,
    workers_died: AtomicU64,
    food_produced: AtomicU64,
    food_eaten: AtomicU64,
    products_made: AtomicU64,
    products_consumed: AtomicU64,
    in_transit: AtomicU64,
    transit_epoch: AtomicU64,
}

fn bump(counter: &AtomicU64, n: u64) {
    counter.fetch_add(n, Ordering::SeqCst);
}

impl FlowLedger {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record workers placed into barracks at construction.
    pub fn record_seeded(&self, n: u64) {
        bump(&self.workers_seeded, n);
    }

    /// Record a newborn worker.
    pub fn record_birth(&self) {
        bump(&self.workers_born, 1);
    }

    /// Record a worker discarded at a barrack.
    pub fn record_death(&self) {
        bump(&self.workers_died, 1);
    }

    /// Record food emitted by a field.
    pub fn record_food_produced(&self) {
        bump(&self.food_produced, 1);
    }

    /// Record food consumed by a dining hall.
    pub fn record_food_eaten(&self) {
        bump(&self.food_eaten, 1);
    }

    /// Record a product emitted by a factory.
    pub fn record_product_made(&self) {
        bump(&self.products_made, 1);
    }

    /// Record a product consumed by a home.
    pub fn record_product_consumed(&self) {
        bump(&self.products_consumed, 1);
    }

    /// Mark `n` workers as about to leave a barrack.
    ///
    /// Must be called before the matching `get`, so that a worker is never
    /// absent from both the barracks and the in-transit count.
    pub fn begin_transit(&self, n: u64) {
        bump(&self.in_transit, n);
    }

    /// Mark `n` workers as written back or discarded.
    ///
    /// Must be called after the matching `add`. Advances the transit epoch.
    pub fn end_transit(&self, n: u64) {
        // fetch_update never fails with a closure that always returns Some.
        let _ = self
            .in_transit
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| {
                Some(v.saturating_sub(n))
            });
        bump(&self.transit_epoch, 1);
    }

    /// Workers currently held by transitions.
    pub fn in_transit(&self) -> u64 {
        self.in_transit.load(Ordering::SeqCst)
    }

    /// Number of completed transits so far. Changes whenever a worker
    /// returns to a barrack or dies.
    pub fn transit_epoch(&self) -> u64 {
        self.transit_epoch.load(Ordering::SeqCst)
    }

    /// A copy of every counter.
    pub fn totals(&self) -> LedgerTotals {
        LedgerTotals {
            workers_seeded: self.workers_seeded.load(Ordering::SeqCst),
            workers_born: self.workers_born.load(Ordering::SeqCst),
            workers_died: self.workers_died.load(Ordering::SeqCst),
            food_produced: self.food_produced.load(Ordering::SeqCst),
            food_eaten: self.food_eaten.load(Ordering::SeqCst),
            products_made: self.products_made.load(Ordering::SeqCst),
            products_consumed: self.products_consumed.load(Ordering::SeqCst),
            in_transit: self.in_transit.load(Ordering::SeqCst),
        }
    }
}

/// A point-in-time copy of the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LedgerTotals {
    /// Workers placed at construction.
    pub workers_seeded: u64,
    /// Workers created by homes.
    pub workers_born: u64,
    /// Workers discarded at barracks.
    pub workers_died: u64,
    /// Food created by fields.
    pub food_produced: u64,
    /// Food consumed by dining halls.
    pub food_eaten: u64,
    /// Products created by factories.
    pub products_made: u64,
    /// Products consumed by homes.
    pub products_consumed: u64,
    /// Workers held by transitions when the copy was taken.
    pub in_transit: u64,
}

impl LedgerTotals {
    /// Workers that should exist: `seeded + born - died`.
    pub const fn expected_workers(&self) -> u64 {
        self.workers_seeded
            .saturating_add(self.workers_born)
            .saturating_sub(self.workers_died)
    }

    /// Food that should be stored: `produced - eaten`.
    pub const fn expected_food(&self) -> u64 {
        self.food_produced.saturating_sub(self.food_eaten)
    }

    /// Products that should be stored: `made - consumed`.
    pub const fn expected_products(&self) -> u64 {
        self.products_made.saturating_sub(self.products_consumed)
    }

    /// Compare the ledger against stored stock.
    ///
    /// Workers in transit are counted as existing. Only meaningful when no
    /// transition is mid-cycle, for example after every actor has stopped.
    pub fn verify(&self, stock: &Stock) -> ConservationResult {
        let checks = [
            (
                ResourceKind::Worker,
                self.expected_workers(),
                count(stock.workers).saturating_add(self.in_transit),
            ),
            (ResourceKind::Food, self.expected_food(), count(stock.food)),
            (
                ResourceKind::Product,
                self.expected_products(),
                count(stock.products),
            ),
        ];
        let imbalances: Vec<Imbalance> = checks
            .into_iter()
            .filter(|(_, expected, actual)| expected != actual)
            .map(|(resource, expected, actual)| Imbalance {
                resource,
                expected,
                actual,
            })
            .collect();
        if imbalances.is_empty() {
            ConservationResult::Balanced
        } else {
            ConservationResult::Imbalanced(imbalances)
        }
    }
}

fn count(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

/// Outcome of a conservation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConservationResult {
    /// Stored stock matches the ledger for every kind.
    Balanced,
    /// One or more kinds disagree.
    Imbalanced(Vec<Imbalance>),
}

impl ConservationResult {
    /// Whether the check passed.
    pub const fn is_balanced(&self) -> bool {
        matches!(self, Self::Balanced)
    }
}

/// A single kind whose stored count differs from the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Imbalance {
    /// The resource kind.
    pub resource: ResourceKind,
    /// Count implied by the ledger.
    pub expected: u64,
    /// Count actually stored (plus in transit, for workers).
    pub actual: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_ledger_balances_empty_stock() {
        let ledger = FlowLedger::new();
        assert!(ledger.totals().verify(&Stock::default()).is_balanced());
    }

    #[test]
    fn worker_expectation_follows_births_and_deaths() {
        let ledger = FlowLedger::new();
        ledger.record_seeded(5);
        ledger.record_birth();
        ledger.record_death();
        ledger.record_death();
        let totals = ledger.totals();
        assert_eq!(totals.expected_workers(), 4);
        let stock = Stock {
            workers: 4,
            ..Stock::default()
        };
        assert!(totals.verify(&stock).is_balanced());
    }

    #[test]
    fn in_transit_workers_count_as_existing() {
        let ledger = FlowLedger::new();
        ledger.record_seeded(3);
        ledger.begin_transit(1);
        let stock = Stock {
            workers: 2,
            ..Stock::default()
        };
        assert!(ledger.totals().verify(&stock).is_balanced());
    }

    #[test]
    fn end_transit_advances_epoch() {
        let ledger = FlowLedger::new();
        ledger.begin_transit(2);
        let before = ledger.transit_epoch();
        ledger.end_transit(2);
        assert_eq!(ledger.in_transit(), 0);
        assert!(ledger.transit_epoch() > before);
        ledger.end_transit(1);
        assert_eq!(ledger.in_transit(), 0);
    }

    #[test]
    fn mismatch_is_reported_per_kind() {
        let ledger = FlowLedger::new();
        ledger.record_food_produced();
        ledger.record_food_produced();
        ledger.record_food_eaten();
        ledger.record_product_made();
        let stock = Stock {
            workers: 0,
            food: 3,
            products: 1,
        };
        let result = ledger.totals().verify(&stock);
        assert_eq!(
            result,
            ConservationResult::Imbalanced(vec![Imbalance {
                resource: ResourceKind::Food,
                expected: 1,
                actual: 3,
            }])
        );
    }
}
