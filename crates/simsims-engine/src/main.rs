//! Engine binary for the SimSims simulation.
//!
//! Loads configuration, builds a world, and runs it on a blocking worker
//! thread until the watchdog ends it or Ctrl-C requests a stop. The final
//! [`RunReport`](simsims_core::RunReport) is logged and printed to stdout
//! as JSON.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `$SIMSIMS_CONFIG` or `simsims-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Build and wire the world
//! 4. Run it, racing the run against Ctrl-C
//! 5. Log and print the report

mod callbacks;
mod error;

use std::sync::Arc;

use simsims_core::{SimulationConfig, World, log_run_end};
use simsims_world::WorldError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::callbacks::{LogCallback, TracingSink};
use crate::error::EngineError;

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded, the world cannot be
/// built, or the run fails.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration. Logging is not up yet, so note the fallback
    //    and report it once the subscriber exists.
    let (config, from_file) = load_config()?;

    // 2. Initialize structured logging. RUST_LOG wins over the config.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("simsims-engine starting");
    if !from_file {
        info!("Config file not found, using defaults");
    }
    info!(
        seed = ?config.world.seed,
        barracks = config.world.barracks,
        storages = config.world.storages,
        barns = config.world.barns,
        initial_workers = config.world.initial_workers,
        budget_ms = config.termination.budget_ms,
        stabilizer = config.stabilizer.enabled,
        "Configuration loaded"
    );

    // 3. Build the world.
    let world = match World::new(config, Arc::new(TracingSink)) {
        Ok(world) => world,
        Err(e @ WorldError::Unwireable { .. }) => {
            warn!(error = %e, "World cannot run");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    // 4. Run on a blocking thread; Ctrl-C raises the stop signal.
    let shutdown = world.shutdown_handle();
    let mut run = tokio::task::spawn_blocking(move || {
        let mut callback = LogCallback::new();
        world.run(&mut callback).map(|report| (report, callback))
    });

    let (report, callback) = tokio::select! {
        joined = &mut run => joined??,
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => {
                    info!("Ctrl-C received, stopping run");
                    shutdown.request_stop();
                }
                Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
            }
            run.await??
        }
    };

    // 5. Log and print the report.
    callback.log_summary();
    log_run_end(&report);
    println!("{}", serde_json::to_string_pretty(&report)?);

    info!(end_reason = %report.end_reason, "simsims-engine shutdown complete");
    Ok(())
}

/// Load the simulation configuration.
///
/// Reads the path from [`SimulationConfig::resolve_path`]. A missing file
/// yields the defaults; the flag reports whether the file was read.
fn load_config() -> Result<(SimulationConfig, bool), EngineError> {
    let config_path = SimulationConfig::resolve_path();
    if config_path.exists() {
        let config = SimulationConfig::from_file(&config_path)?;
        Ok((config, true))
    } else {
        Ok((SimulationConfig::default(), false))
    }
}
