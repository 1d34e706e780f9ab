//! End-to-end runs of the process loop over a populated sandbox world.

use catalog::Catalog;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::fs;
use std::time::Duration;
use tempfile::tempdir;
use war_core::{DiagnosticLog, ProcessLoop, SandboxWorld, TickOutcome, WarConfig, WarTransition};
use war_events::Position;

fn sample_catalog() -> Catalog {
    let content = fs::read_to_string("../../data/catalog.json").unwrap();
    let records: Vec<catalog::ArchetypeRecord> = serde_json::from_str(&content).unwrap();
    let count = records.len();
    Catalog::from_records(records, count).unwrap()
}

fn config() -> WarConfig {
    let mut config = WarConfig::default();
    config.sampler.scan_interval = 5;
    config
}

fn populated_world(catalog: &Catalog, seed: u64, count: usize) -> SandboxWorld {
    let mut world = SandboxWorld::new();
    world.spawn_player(Position::default());
    let mut models = catalog.hashes();
    models.push(0x0000_C1A1);
    let mut rng = SmallRng::seed_from_u64(seed);
    world.populate(&mut rng, Position::default(), 60.0, count, &models);
    world
}

/// Test that a full run writes a readable log and ends with a clean teardown
#[test]
fn test_run_writes_diagnostic_log() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("war.jsonl");
    let catalog = sample_catalog();
    let mut world = populated_world(&catalog, 3, 20);
    let config = config();

    let mut process = ProcessLoop::new(&config, catalog, DiagnosticLog::new(&path).unwrap());
    process.activate(&mut world);

    let mut engagements = 0;
    for _ in 0..40 {
        world.step(Duration::from_millis(2500));
        if let TickOutcome::Ran(report) = process.tick(&mut world) {
            engagements += report.combat.engagements();
        }
    }
    let registered = process.engine().total_count();
    let transition = process.deactivate(&mut world);

    assert!(registered > 0);
    assert!(engagements > 0);
    assert_eq!(process.cycles(), 40);
    assert!(matches!(transition, WarTransition::Deactivated { faults: 0, .. }));
    assert_eq!(process.engine().total_count(), 0);

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<serde_json::Value> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len() as u64, process.log().event_count());
    assert_eq!(lines[0]["type"], "war_activated");
    assert_eq!(lines[0]["event_id"], "evt_00000001");
    assert_eq!(lines.last().unwrap()["type"], "war_deactivated");
    let run_id = process.log().run_id().to_string();
    assert!(lines.iter().all(|l| l["run_id"] == run_id.as_str()));
    assert!(lines.iter().any(|l| l["type"] == "engaged"));
}

/// Test that the registered population never exceeds the cap
#[test]
fn test_population_stays_under_cap() {
    let catalog = sample_catalog();
    let mut world = populated_world(&catalog, 8, 60);
    let mut config = config();
    config.sampler.max_total_agents = 6;
    config.sampler.scan_interval = 0;

    let mut process = ProcessLoop::new(&config, catalog, DiagnosticLog::null());
    process.activate(&mut world);

    for _ in 0..20 {
        world.step(Duration::from_millis(2500));
        process.tick(&mut world);
        assert!(process.engine().total_count() <= 6);
    }
}

/// Test that deactivating stops further cycles
#[test]
fn test_deactivated_loop_is_inert() {
    let catalog = sample_catalog();
    let mut world = populated_world(&catalog, 4, 10);
    let mut process = ProcessLoop::new(&config(), catalog, DiagnosticLog::null());
    process.activate(&mut world);
    process.tick(&mut world);

    process.deactivate(&mut world);

    assert_eq!(process.tick(&mut world), TickOutcome::Inactive);
    assert_eq!(process.engine().total_count(), 0);
}
