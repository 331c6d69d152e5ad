//! Configuration loading and typed config structures for the SimSims simulation.
//!
//! The canonical configuration lives in `simsims-config.yaml` in the working
//! directory; the `SIMSIMS_CONFIG` environment variable points at another
//! file. This module defines strongly-typed structs that mirror the YAML
//! structure, and a loader that reads and parses the file. Every key is
//! optional and falls back to the defaults below.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use simsims_transitions::RuleConfig;
use simsims_types::TransitionKind;
use simsims_world::PlaceCounts;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "simsims-config.yaml";

/// Environment variable that overrides the configuration file path.
pub const CONFIG_ENV_VAR: &str = "SIMSIMS_CONFIG";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `simsims-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Topology: place and transition counts, initial workers, seed.
    #[serde(default)]
    pub world: WorldConfig,

    /// Production rule parameters and actor pacing.
    #[serde(default)]
    pub rules: RuleConfig,

    /// Feedback controller settings.
    #[serde(default)]
    pub stabilizer: StabilizerConfig,

    /// When a run ends.
    #[serde(default)]
    pub termination: TerminationConfig,

    /// Snapshot cadence.
    #[serde(default)]
    pub observer: ObserverConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// The configuration file to read: `$SIMSIMS_CONFIG` if set, otherwise
    /// `simsims-config.yaml`.
    pub fn resolve_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV_VAR)
            .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from)
    }
}

/// World topology.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Seed for wiring and seeding. Omit for a fresh seed every run.
    ///
    /// Only construction is seeded; actor threads draw from their own
    /// generators, so runs are not reproducible cycle by cycle.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Number of barracks (must be at least 1).
    #[serde(default = "default_one")]
    pub barracks: usize,

    /// Number of storages (must be at least 1).
    #[serde(default = "default_one")]
    pub storages: usize,

    /// Number of barns (must be at least 1).
    #[serde(default = "default_one")]
    pub barns: usize,

    /// Number of dining halls.
    #[serde(default = "default_one")]
    pub dining_halls: usize,

    /// Number of homes.
    #[serde(default = "default_one")]
    pub homes: usize,

    /// Number of fields.
    #[serde(default = "default_fields")]
    pub fields: usize,

    /// Number of factories.
    #[serde(default = "default_factories")]
    pub factories: usize,

    /// Workers placed into random barracks at construction.
    #[serde(default = "default_initial_workers")]
    pub initial_workers: usize,
}

impl WorldConfig {
    /// The place counts to allocate.
    pub const fn place_counts(&self) -> PlaceCounts {
        PlaceCounts {
            barracks: self.barracks,
            storages: self.storages,
            barns: self.barns,
        }
    }

    /// Configured number of transitions of `kind`.
    pub const fn transitions(&self, kind: TransitionKind) -> usize {
        match kind {
            TransitionKind::Field => self.fields,
            TransitionKind::DiningHall => self.dining_halls,
            TransitionKind::Home => self.homes,
            TransitionKind::Factory => self.factories,
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: None,
            barracks: default_one(),
            storages: default_one(),
            barns: default_one(),
            dining_halls: default_one(),
            homes: default_one(),
            fields: default_fields(),
            factories: default_factories(),
            initial_workers: default_initial_workers(),
        }
    }
}

/// Feedback controller settings.
///
/// Each pass closes or reopens at most one transition per kind, nudges home
/// priorities toward the worker target, and optionally rewires one random
/// transition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StabilizerConfig {
    /// Whether the stabilizer runs at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Milliseconds between passes.
    #[serde(default = "default_stabilizer_interval_ms")]
    pub interval_ms: u64,

    /// Target total of stored workers.
    #[serde(default = "default_target_workers")]
    pub target_workers: usize,

    /// Target total of stored food.
    #[serde(default = "default_target_food")]
    pub target_food: usize,

    /// Target total of stored products.
    #[serde(default = "default_target_products")]
    pub target_products: usize,

    /// Largest priority change applied to a home in one pass.
    #[serde(default = "default_priority_gain")]
    pub priority_gain: f64,

    /// Whether each pass rewires one random transition.
    #[serde(default = "default_true")]
    pub rewire: bool,
}

impl StabilizerConfig {
    /// Pause between passes, at least 1 ms.
    pub const fn interval(&self) -> Duration {
        loop_interval(self.interval_ms)
    }
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: default_stabilizer_interval_ms(),
            target_workers: default_target_workers(),
            target_food: default_target_food(),
            target_products: default_target_products(),
            priority_gain: default_priority_gain(),
            rewire: true,
        }
    }
}

/// Termination watchdog settings.
///
/// A `budget_ms` of 0 means the run only ends when the barracks empty or a
/// stop is requested.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TerminationConfig {
    /// Milliseconds between watchdog checks.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Wall-clock budget in milliseconds (0 = unlimited).
    #[serde(default = "default_budget_ms")]
    pub budget_ms: u64,
}

impl TerminationConfig {
    /// Pause between watchdog checks, at least 1 ms.
    pub const fn poll_interval(&self) -> Duration {
        loop_interval(self.poll_interval_ms)
    }

    /// The wall-clock budget, if any.
    pub const fn budget(&self) -> Option<Duration> {
        if self.budget_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.budget_ms))
        }
    }
}

impl Default for TerminationConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            budget_ms: default_budget_ms(),
        }
    }
}

/// Snapshot sampling settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObserverConfig {
    /// Milliseconds between population snapshots.
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,
}

impl ObserverConfig {
    /// Pause between snapshots, at least 1 ms.
    pub const fn sample_interval(&self) -> Duration {
        loop_interval(self.sample_interval_ms)
    }
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: default_sample_interval_ms(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_true() -> bool {
    true
}

const fn default_one() -> usize {
    1
}

const fn default_fields() -> usize {
    4
}

const fn default_factories() -> usize {
    5
}

const fn default_initial_workers() -> usize {
    20
}

const fn default_stabilizer_interval_ms() -> u64 {
    200
}

const fn default_target_workers() -> usize {
    40
}

const fn default_target_food() -> usize {
    40
}

const fn default_target_products() -> usize {
    50
}

const fn default_priority_gain() -> f64 {
    0.05
}

const fn default_poll_interval_ms() -> u64 {
    50
}

const fn default_budget_ms() -> u64 {
    30_000
}

const fn default_sample_interval_ms() -> u64 {
    100
}

/// Control loop pause. Zero is raised to 1 ms so a loop never spins.
const fn loop_interval(ms: u64) -> Duration {
    if ms == 0 {
        Duration::from_millis(1)
    } else {
        Duration::from_millis(ms)
    }
}

fn default_log_level() -> String {
    "info".to_owned()
}
