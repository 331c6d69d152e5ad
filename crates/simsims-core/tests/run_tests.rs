//! Integration tests for complete runs.
//!
//! Each test builds a small world with millisecond pacing, runs it on the
//! test thread, and checks the returned report.

#![allow(
    clippy::unwrap_used,
    clippy::arithmetic_side_effects,
    clippy::indexing_slicing
)]

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use simsims_core::config::{StabilizerConfig, TerminationConfig, WorldConfig};
use simsims_core::{NoOpCallback, SimulationConfig, SnapshotLog, World};
use simsims_transitions::RuleConfig;
use simsims_types::EndReason;
use simsims_world::{ConservationResult, NoOpSink, WorldError};

fn fast_rules() -> RuleConfig {
    RuleConfig {
        cycle_delay_ms: 1,
        poll_delay_ms: 1,
        closed_backoff_ms: 2,
        ..RuleConfig::default()
    }
}

/// A world whose only transition is a home with no products to consume, so
/// workers never leave their barracks.
fn idle_world(workers: usize, budget_ms: u64) -> SimulationConfig {
    SimulationConfig {
        world: WorldConfig {
            seed: Some(5),
            dining_halls: 0,
            homes: 1,
            fields: 0,
            factories: 0,
            initial_workers: workers,
            ..WorldConfig::default()
        },
        rules: fast_rules(),
        termination: TerminationConfig {
            poll_interval_ms: 5,
            budget_ms,
        },
        ..SimulationConfig::default()
    }
}

#[test]
fn empty_world_ends_before_the_first_poll_interval() {
    let mut config = idle_world(0, 10_000);
    config.termination.poll_interval_ms = 2_000;
    let world = World::new(config, Arc::new(NoOpSink)).unwrap();
    let report = world.run(&mut NoOpCallback).unwrap();

    assert_eq!(report.end_reason, EndReason::BarracksEmpty);
    assert!(report.elapsed_ms < 1_000, "took {} ms", report.elapsed_ms);
    assert_eq!(report.final_snapshot.total_workers, 0);
    assert!(report.faulted.is_empty());
}

#[test]
fn occupied_world_ends_at_budget() {
    let world = World::new(idle_world(3, 120), Arc::new(NoOpSink)).unwrap();
    let report = world.run(&mut NoOpCallback).unwrap();

    assert_eq!(report.end_reason, EndReason::BudgetElapsed);
    assert!(report.elapsed_ms >= 120);
    assert_eq!(report.final_snapshot.total_workers, 3);
    assert_eq!(report.cycles_fired, 0);
    assert!(report.cycles_starved > 0);
    assert_eq!(report.conservation(), ConservationResult::Balanced);
}

#[test]
fn shutdown_handle_stops_an_unbounded_run() {
    let world = World::new(idle_world(2, 0), Arc::new(NoOpSink)).unwrap();
    let handle = world.shutdown_handle();

    let report = thread::scope(|s| {
        s.spawn(|| {
            thread::sleep(Duration::from_millis(50));
            assert!(handle.request_stop());
        });
        world.run(&mut NoOpCallback).unwrap()
    });

    assert_eq!(report.end_reason, EndReason::ExternalStop);
    assert!(handle.is_stopped());
    assert!(!handle.request_stop());
}

#[test]
fn small_world_conserves_every_resource() {
    let config = SimulationConfig {
        world: WorldConfig {
            seed: Some(42),
            barracks: 1,
            storages: 1,
            barns: 1,
            dining_halls: 0,
            homes: 0,
            fields: 1,
            factories: 1,
            initial_workers: 5,
        },
        rules: fast_rules(),
        stabilizer: StabilizerConfig {
            interval_ms: 10,
            target_workers: 5,
            target_food: 5,
            target_products: 5,
            ..StabilizerConfig::default()
        },
        termination: TerminationConfig {
            poll_interval_ms: 5,
            budget_ms: 300,
        },
        ..SimulationConfig::default()
    };
    let world = World::new(config, Arc::new(NoOpSink)).unwrap();
    let report = world.run(&mut NoOpCallback).unwrap();

    assert!(report.faulted.is_empty());
    assert_eq!(report.conservation(), ConservationResult::Balanced);
    assert_eq!(report.ledger.in_transit, 0);
    assert_eq!(report.ledger.workers_born, 0);

    let workers = u64::try_from(report.final_snapshot.total_workers).unwrap();
    assert_eq!(workers + report.ledger.workers_died, 5);
    assert_eq!(
        u64::try_from(report.final_snapshot.total_food).unwrap(),
        report.ledger.food_produced
    );
    assert_eq!(
        u64::try_from(report.final_snapshot.total_products).unwrap(),
        report.ledger.products_made
    );
}

#[test]
fn default_world_stays_balanced() {
    let config = SimulationConfig {
        world: WorldConfig {
            seed: Some(7),
            ..WorldConfig::default()
        },
        rules: fast_rules(),
        stabilizer: StabilizerConfig {
            interval_ms: 10,
            ..StabilizerConfig::default()
        },
        termination: TerminationConfig {
            poll_interval_ms: 5,
            budget_ms: 250,
        },
        ..SimulationConfig::default()
    };
    let world = World::new(config, Arc::new(NoOpSink)).unwrap();
    let report = world.run(&mut NoOpCallback).unwrap();

    assert_ne!(report.end_reason, EndReason::ExternalStop);
    assert!(report.faulted.is_empty());
    assert_eq!(report.ledger.in_transit, 0);
    assert_eq!(report.conservation(), ConservationResult::Balanced);
}

#[test]
fn disabled_stabilizer_runs_no_passes() {
    let mut config = idle_world(1, 60);
    config.stabilizer.enabled = false;
    let world = World::new(config, Arc::new(NoOpSink)).unwrap();
    let report = world.run(&mut NoOpCallback).unwrap();

    assert_eq!(report.stabilizer_passes, 0);
    assert_eq!(report.end_reason, EndReason::BudgetElapsed);
}

#[test]
fn snapshot_log_ends_with_the_final_snapshot() {
    let mut config = idle_world(4, 100);
    config.observer.sample_interval_ms = 10;
    let world = World::new(config, Arc::new(NoOpSink)).unwrap();
    let run_id = world.run_id();
    let mut log = SnapshotLog::new();
    let report = world.run(&mut log).unwrap();

    assert_eq!(log.last(), Some(&report.final_snapshot));
    assert_eq!(
        u64::try_from(log.snapshots().len()).unwrap(),
        report.snapshots_taken
    );
    assert!(log.snapshots().iter().all(|s| s.run_id == run_id));
    assert!(log.snapshots().iter().all(|s| s.total_workers == 4));
}

#[test]
fn zero_sample_interval_does_not_spin() {
    let mut config = idle_world(2, 50);
    config.observer.sample_interval_ms = 0;
    let world = World::new(config, Arc::new(NoOpSink)).unwrap();
    let mut log = SnapshotLog::new();
    let report = world.run(&mut log).unwrap();

    assert_eq!(report.end_reason, EndReason::BudgetElapsed);
    let bound = 2 * report.elapsed_ms + 10;
    assert!(
        report.snapshots_taken <= bound,
        "{} snapshots in {} ms",
        report.snapshots_taken,
        report.elapsed_ms
    );
}

#[test]
fn report_serializes_for_the_engine() {
    let world = World::new(idle_world(3, 40), Arc::new(NoOpSink)).unwrap();
    let report = world.run(&mut NoOpCallback).unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["end_reason"], "budget_elapsed");
    assert_eq!(json["run_id"], report.run_id.to_string());
    assert_eq!(json["ledger"]["workers_died"], 0);
    assert_eq!(json["ledger"]["workers_seeded"], 3);
    assert_eq!(json["final_snapshot"]["total_workers"], 3);
    assert_eq!(json["seeded_workers"], 3);
    assert!(json["faulted"].as_array().unwrap().is_empty());
    assert!(json["started_at"].is_string());
}

#[test]
fn missing_barns_cannot_be_wired() {
    let config = SimulationConfig {
        world: WorldConfig {
            barns: 0,
            ..WorldConfig::default()
        },
        ..SimulationConfig::default()
    };
    let result = World::new(config, Arc::new(NoOpSink));
    assert!(matches!(result, Err(WorldError::Unwireable { barns: 0, .. })));
}
