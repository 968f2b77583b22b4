//! Integration tests for the `stoneage-db` file stores.
//!
//! Every test works in its own uuid-named directory under the system temp
//! directory and removes it afterwards.

// Integration tests use expect/unwrap extensively for clarity -- panicking
// on failure is the correct behavior in test code.
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use stoneage_db::{BRAIN_FILE_VERSION, BrainFile, DbError, GRAVEYARD_COLUMNS, GraveyardStore, ReportWriter};
use stoneage_types::{
    Agent, DeathCause, FactionId, GeneticBand, PopulationBand, QTable, ReportSnapshot,
    ResourceBand, Sex, StateKey,
};

// =============================================================================
// Helpers
// =============================================================================

/// A fresh scratch directory, removed when dropped.
struct Scratch(PathBuf);

impl Scratch {
    fn new() -> Self {
        let dir = std::env::temp_dir().join(format!("stoneage-db-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).expect("create scratch dir");
        Self(dir)
    }

    fn path(&self, name: &str) -> PathBuf {
        self.0.join(name)
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

fn dead_agent(faction: &str, cause: DeathCause, day: u64) -> Agent {
    let mut agent = Agent::new(FactionId::new(faction), Sex::Male, 50.0, 0);
    assert!(agent.mark_dead(cause, day));
    agent
}

fn state(population: PopulationBand) -> StateKey {
    StateKey {
        population,
        genetics: GeneticBand::Mixed,
        resources: ResourceBand::Scarce,
    }
}

fn report(run_number: u32) -> ReportSnapshot {
    ReportSnapshot {
        day: 123,
        run_number,
        cause: String::from("Manual Reset"),
        living: 10,
        total_spawned: 20,
        archived: 5,
        deaths_by_cause: BTreeMap::from([(DeathCause::Starvation, 10)]),
        diseases_emerged: 1,
        factions: Vec::new(),
    }
}

// =============================================================================
// Graveyard
// =============================================================================

#[test]
fn graveyard_writes_header_once() {
    let scratch = Scratch::new();
    let store = GraveyardStore::new(scratch.path("archive/graveyard.csv"));

    assert_eq!(store.append(&[]).unwrap(), 0);
    assert!(!store.path().exists());

    let first = vec![
        dead_agent("red_tribe", DeathCause::Disease, 10),
        dead_agent("blue_tribe", DeathCause::OldAge, 11),
    ];
    assert_eq!(store.append(&first).unwrap(), 2);
    assert_eq!(store.append(&[dead_agent("red_tribe", DeathCause::Childbirth, 40)]).unwrap(), 1);

    let contents = fs::read_to_string(store.path()).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], GRAVEYARD_COLUMNS.join(","));
    assert_eq!(contents.matches("schema_version").count(), 1);
    assert!(lines[1].contains("disease"));
    assert!(lines[3].contains("childbirth"));
}

#[test]
fn graveyard_appends_across_store_instances() {
    let scratch = Scratch::new();
    let path = scratch.path("graveyard.csv");
    GraveyardStore::new(&path)
        .append(&[dead_agent("red_tribe", DeathCause::Starvation, 3)])
        .unwrap();
    GraveyardStore::new(&path)
        .append(&[dead_agent("red_tribe", DeathCause::Starvation, 4)])
        .unwrap();
    let contents = fs::read_to_string(&path).unwrap();
    assert_eq!(contents.lines().count(), 3);
}

// =============================================================================
// Reports
// =============================================================================

#[test]
fn summary_file_is_named_by_time_and_run() {
    let scratch = Scratch::new();
    let writer = ReportWriter::new(scratch.path("reports"), scratch.path("crash.log"));
    let path = writer.write_summary(&report(3)).unwrap();

    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("summary_"));
    assert!(name.ends_with("_3.txt"));
    // summary_YYYYmmdd_HHMMSS_3.txt
    assert_eq!(name.len(), "summary_".len() + 15 + "_3.txt".len());

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("Cause: Manual Reset"));
    assert!(text.contains("starvation: 10"));
}

#[test]
fn crash_report_is_overwritten() {
    let scratch = Scratch::new();
    let writer = ReportWriter::new(scratch.path("reports"), scratch.path("crash.log"));
    writer.write_crash(5, "first failure").unwrap();
    let path = writer.write_crash(9, "second failure").unwrap();

    let text = fs::read_to_string(path).unwrap();
    assert!(text.contains("Day: 9"));
    assert!(text.contains("second failure"));
    assert!(!text.contains("first failure"));
}

// =============================================================================
// Brain file
// =============================================================================

#[test]
fn missing_brain_file_loads_empty() {
    let scratch = Scratch::new();
    let file = BrainFile::new(scratch.path("faction_brains.json"));
    assert!(file.load().unwrap().is_empty());
}

#[test]
fn brains_survive_save_and_load() {
    let scratch = Scratch::new();
    let file = BrainFile::new(scratch.path("nested/faction_brains.json"));

    let mut red = QTable::new();
    red.insert(state(PopulationBand::Critical), [0.5, -1.0, 0.0, 0.0, 2.25, 0.0, 0.0, 0.0, -3.5]);
    red.insert(state(PopulationBand::Healthy), [1.0; 9]);
    let mut brains = BTreeMap::new();
    brains.insert(FactionId::new("red_tribe"), red.clone());
    brains.insert(FactionId::new("blue_tribe"), QTable::new());

    file.save(&brains).unwrap();
    assert!(!scratch.path("nested/faction_brains.json.tmp").exists());

    let loaded = file.load().unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[&FactionId::new("red_tribe")], red);
    assert!(loaded[&FactionId::new("blue_tribe")].is_empty());
}

#[test]
fn brain_file_rejects_wrong_version() {
    let scratch = Scratch::new();
    let path = scratch.path("faction_brains.json");
    let json = format!(
        r#"{{"version": {}, "actions": 9, "factions": {{}}}}"#,
        BRAIN_FILE_VERSION + 1
    );
    fs::write(&path, json).unwrap();
    assert!(matches!(BrainFile::new(&path).load(), Err(DbError::Schema { .. })));
}

#[test]
fn brain_file_rejects_wrong_action_count() {
    let scratch = Scratch::new();
    let path = scratch.path("faction_brains.json");
    fs::write(&path, r#"{"version": 1, "actions": 4, "factions": {}}"#).unwrap();
    assert!(matches!(BrainFile::new(&path).load(), Err(DbError::Schema { .. })));
}

#[test]
fn brain_file_rejects_short_rows() {
    let scratch = Scratch::new();
    let path = scratch.path("faction_brains.json");
    let json = r#"{
        "version": 1,
        "actions": 9,
        "factions": {
            "red_tribe": [
                { "state": { "population": "Low", "genetics": "Pure", "resources": "Famine" },
                  "values": [1.0, 2.0] }
            ]
        }
    }"#;
    fs::write(&path, json).unwrap();
    assert!(matches!(BrainFile::new(&path).load(), Err(DbError::Schema { .. })));
}

#[test]
fn brain_file_rejects_garbage() {
    let scratch = Scratch::new();
    let path = scratch.path("faction_brains.json");
    fs::write(&path, "not json at all").unwrap();
    assert!(matches!(BrainFile::new(&path).load(), Err(DbError::Serialization(_))));
}
