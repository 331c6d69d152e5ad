//! Tunables for the production rules and the actor loop.
//!
//! The [`RuleConfig`] struct bundles every rule parameter so that callers
//! (the world, tests) can override defaults. It is read from the `rules`
//! section of `simsims-config.yaml`; omitted keys take the defaults below.

use std::time::Duration;

use serde::Deserialize;

/// Configuration for the four production rules and the actor loop.
///
/// Ranges are given as `min`/`max` pairs. A pair written in the wrong order
/// is tolerated: the rules always sample between the smaller and the larger
/// bound.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Probability that a field cycle injures its worker (default: 0.2).
    pub field_injury_chance: f64,

    /// Smallest vitality loss from a field injury (default: 30).
    pub field_injury_min: u8,

    /// Largest vitality loss from a field injury, inclusive (default: 80).
    pub field_injury_max: u8,

    /// Scale of the dining curve `scale * atan(6q - 2)` (default: 25.0).
    pub dining_scale: f64,

    /// Smallest vitality gain from resting at a home (default: 10).
    pub rest_gain_min: u8,

    /// Upper bound of the rest gain, exclusive (default: 35).
    pub rest_gain_max: u8,

    /// Scale of the factory wear term `-scale * r^2` (default: 40.0).
    pub factory_wear_scale: f64,

    /// Number of factory harm levels; each factory draws a fixed level in
    /// `[0, factory_harm_levels)` at construction (default: 10).
    pub factory_harm_levels: u8,

    /// Initial home priority in `[0, 1]` (default: 0.5).
    ///
    /// A home attempts reproduction with probability `1 - priority`.
    pub home_priority: f64,

    /// Pause after a cycle that fired, in milliseconds (default: 20).
    pub cycle_delay_ms: u64,

    /// Pause after a failed reservation, in milliseconds (default: 5).
    pub poll_delay_ms: u64,

    /// Pause between checks while closed, in milliseconds (default: 50).
    pub closed_backoff_ms: u64,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            field_injury_chance: 0.2,
            field_injury_min: 30,
            field_injury_max: 80,
            dining_scale: 25.0,
            rest_gain_min: 10,
            rest_gain_max: 35,
            factory_wear_scale: 40.0,
            factory_harm_levels: 10,
            home_priority: 0.5,
            cycle_delay_ms: 20,
            poll_delay_ms: 5,
            closed_backoff_ms: 50,
        }
    }
}

impl RuleConfig {
    /// Injury probability clamped to `[0, 1]`. NaN counts as 0.
    pub fn injury_chance(&self) -> f64 {
        probability(self.field_injury_chance)
    }

    /// Initial home priority clamped to `[0, 1]`.
    pub fn initial_priority(&self) -> f64 {
        probability(self.home_priority)
    }

    /// Pause after a fired cycle.
    pub const fn cycle_delay(&self) -> Duration {
        Duration::from_millis(self.cycle_delay_ms)
    }

    /// Pause after a starved cycle.
    pub const fn poll_delay(&self) -> Duration {
        Duration::from_millis(self.poll_delay_ms)
    }

    /// Pause between checks while closed.
    pub const fn closed_backoff(&self) -> Duration {
        Duration::from_millis(self.closed_backoff_ms)
    }
}

/// Clamp a probability into `[0, 1]`, mapping NaN to 0.
pub fn probability(p: f64) -> f64 {
    if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
}
