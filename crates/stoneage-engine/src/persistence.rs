//! Collaborator adapters over the `stoneage-db` file stores.
//!
//! Each adapter implements one kernel collaborator trait. Every
//! [`stoneage_db::DbError`] stops here: it is logged and swallowed, and the
//! in-memory state stays authoritative. A failed graveyard write leaves the
//! dead rows in the live table so the next archiver pass retries them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use stoneage_agents::PopulationTable;
use stoneage_core::{Archiver, BrainStore, Reporter, StorageConfig};
use stoneage_db::{BrainFile, GraveyardStore, ReportWriter};
use stoneage_types::{Agent, FactionId, QTable, ReportSnapshot};
use tracing::{debug, error, info, warn};

/// Resolved on-disk locations under the data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    /// Graveyard CSV.
    pub graveyard: PathBuf,
    /// Directory of run summaries.
    pub reports_dir: PathBuf,
    /// Crash report.
    pub crash: PathBuf,
    /// Q-table file.
    pub brains: PathBuf,
}

impl StoragePaths {
    /// Join every configured location onto `data_dir`.
    pub fn resolve(config: &StorageConfig) -> Self {
        let root = Path::new(&config.data_dir);
        Self {
            graveyard: root.join(&config.graveyard_file),
            reports_dir: root.join(&config.reports_dir),
            crash: root.join(&config.crash_file),
            brains: root.join(&config.brain_file),
        }
    }
}

// ---------------------------------------------------------------------------
// Archiver
// ---------------------------------------------------------------------------

/// Archives dead rows into the graveyard CSV.
#[derive(Debug, Clone)]
pub struct GraveyardArchiver {
    store: GraveyardStore,
}

impl GraveyardArchiver {
    /// Archiver appending to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            store: GraveyardStore::new(path),
        }
    }
}

impl Archiver for GraveyardArchiver {
    fn archive_dead(&mut self, mut population: PopulationTable) -> PopulationTable {
        let dead: Vec<Agent> = population.dead().cloned().collect();
        if dead.is_empty() {
            return population;
        }
        match self.store.append(&dead) {
            Ok(written) => {
                let removed = population.remove_dead();
                debug!(written, removed = removed.len(), "dead agents archived");
            }
            Err(err) => {
                warn!(error = %err, pending = dead.len(), "graveyard write failed, keeping dead rows in memory");
            }
        }
        population
    }
}

// ---------------------------------------------------------------------------
// Reporter
// ---------------------------------------------------------------------------

/// Writes summaries and crash reports as text files.
#[derive(Debug, Clone)]
pub struct FileReporter {
    writer: ReportWriter,
}

impl FileReporter {
    /// Reporter writing summaries to `reports_dir` and crashes to `crash_path`.
    pub fn new(reports_dir: impl Into<PathBuf>, crash_path: impl Into<PathBuf>) -> Self {
        Self {
            writer: ReportWriter::new(reports_dir, crash_path),
        }
    }
}

impl Reporter for FileReporter {
    fn save_report(&mut self, report: &ReportSnapshot) -> Option<PathBuf> {
        match self.writer.write_summary(report) {
            Ok(path) => Some(path),
            Err(err) => {
                error!(error = %err, run = report.run_number, "failed to write run summary");
                None
            }
        }
    }

    fn save_crash_report(&mut self, day: u64, error: &str) -> Option<PathBuf> {
        match self.writer.write_crash(day, error) {
            Ok(path) => Some(path),
            Err(err) => {
                error!(error = %err, day, "failed to write crash report");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Brain store
// ---------------------------------------------------------------------------

/// Stores faction Q-tables in the JSON brain file.
#[derive(Debug, Clone)]
pub struct FileBrainStore {
    file: BrainFile,
}

impl FileBrainStore {
    /// Store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: BrainFile::new(path),
        }
    }
}

impl BrainStore for FileBrainStore {
    fn save(&mut self, brains: &BTreeMap<FactionId, QTable>) -> bool {
        match self.file.save(brains) {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "failed to save faction brains");
                false
            }
        }
    }

    fn load(&mut self) -> BTreeMap<FactionId, QTable> {
        match self.file.load() {
            Ok(brains) => {
                if !brains.is_empty() {
                    info!(path = %self.file.path().display(), factions = brains.len(), "loaded faction brains");
                }
                brains
            }
            Err(err) => {
                warn!(error = %err, "faction brains unusable, starting fresh");
                BTreeMap::new()
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::fs;

    use stoneage_types::{DeathCause, Sex};

    use super::*;

    fn scratch() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("stoneage-engine-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn population_with_dead() -> PopulationTable {
        let mut population = PopulationTable::new();
        let dead = population
            .insert(Agent::new(FactionId::new("red_tribe"), Sex::Male, 60.0, 0))
            .unwrap();
        population
            .insert(Agent::new(FactionId::new("red_tribe"), Sex::Female, 20.0, 0))
            .unwrap();
        population.kill(&dead, DeathCause::OldAge, 12).unwrap();
        population
    }

    #[test]
    fn storage_paths_join_data_dir() {
        let paths = StoragePaths::resolve(&StorageConfig::default());
        assert_eq!(paths.graveyard, PathBuf::from("data/archive/graveyard.csv"));
        assert_eq!(paths.reports_dir, PathBuf::from("data/reports"));
        assert_eq!(paths.crash, PathBuf::from("data/crash.log"));
        assert_eq!(paths.brains, PathBuf::from("data/faction_brains.json"));
    }

    #[test]
    fn archiver_moves_dead_rows_to_disk() {
        let dir = scratch();
        let path = dir.join("graveyard.csv");
        let mut archiver = GraveyardArchiver::new(&path);

        let population = archiver.archive_dead(population_with_dead());
        assert_eq!(population.len(), 1);
        assert_eq!(population.archived_count(), 1);
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);

        let population = archiver.archive_dead(population);
        assert_eq!(population.len(), 1);
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn archiver_keeps_rows_when_write_fails() {
        let dir = scratch();
        // A directory where the file should be makes the open fail.
        let path = dir.join("graveyard.csv");
        fs::create_dir_all(&path).unwrap();
        let mut archiver = GraveyardArchiver::new(&path);

        let population = archiver.archive_dead(population_with_dead());
        assert_eq!(population.len(), 2);
        assert_eq!(population.dead_count(), 1);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn unreadable_brains_load_empty() {
        let dir = scratch();
        let path = dir.join("faction_brains.json");
        fs::write(&path, "{ broken").unwrap();
        let mut store = FileBrainStore::new(&path);
        assert!(store.load().is_empty());

        let mut tables = BTreeMap::new();
        tables.insert(FactionId::new("blue_tribe"), QTable::new());
        assert!(store.save(&tables));
        assert_eq!(store.load().len(), 1);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn reporter_swallows_write_failures() {
        let dir = scratch();
        let blocker = dir.join("reports");
        fs::write(&blocker, "not a directory").unwrap();
        let mut reporter = FileReporter::new(&blocker, dir.join("crash.log"));
        let report = ReportSnapshot {
            day: 1,
            run_number: 1,
            cause: String::from("Manual Reset"),
            living: 0,
            total_spawned: 0,
            archived: 0,
            deaths_by_cause: BTreeMap::new(),
            diseases_emerged: 0,
            factions: Vec::new(),
        };
        assert!(reporter.save_report(&report).is_none());
        assert!(reporter.save_crash_report(1, "boom").is_some());
        fs::remove_dir_all(dir).unwrap();
    }
}
