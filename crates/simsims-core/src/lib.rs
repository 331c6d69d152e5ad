//! World construction and run orchestration for the SimSims simulation.
//!
//! A [`World`] owns every place and transition of one run. Running it starts
//! one thread per transition plus three control loops that share a single
//! stop signal:
//!
//! - the watchdog, which ends the run when every barrack is empty or the
//!   wall-clock budget has elapsed;
//! - the stabilizer, which closes, reopens, reprioritizes, and rewires
//!   transitions to keep stock near its targets;
//! - the observer, which samples population totals for external consumers.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `simsims-config.yaml` into
//!   strongly-typed structs.
//! - [`signal`] -- [`StopSignal`] and the external [`ShutdownHandle`].
//! - [`world`] -- [`World`] construction, wiring, and [`World::run`].
//! - [`watchdog`] -- Termination detection.
//! - [`stabilizer`] -- The feedback controller.
//! - [`observer`] -- [`SnapshotCallback`] and periodic sampling.
//! - [`report`] -- [`RunReport`] and its log summary.

pub mod config;
pub mod observer;
pub mod report;
pub mod signal;
pub mod stabilizer;
pub mod watchdog;
pub mod world;

// Re-export primary types at crate root.
pub use config::{ConfigError, SimulationConfig};
pub use observer::{NoOpCallback, SnapshotCallback, SnapshotLog};
pub use report::{RunReport, log_run_end};
pub use signal::{ShutdownHandle, StopSignal};
pub use stabilizer::{PassReport, Stabilizer, closed_target};
pub use world::World;
