//! Interfaces of the external collaborators the kernel consumes.
//!
//! The kernel never touches the filesystem itself. It hands dead rows to an
//! [`Archiver`], end-of-run summaries to a [`Reporter`] and Q-tables to a
//! [`BrainStore`]. Implementations must log and swallow their own I/O
//! failures: in-memory state stays authoritative and no persistence fault
//! may abort a tick.
//!
//! The in-memory implementations here back tests and headless runs. They are
//! cheaply cloneable handles over shared storage, so a caller can keep one
//! clone for inspection after moving the other into the kernel.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use stoneage_agents::PopulationTable;
use stoneage_types::{Agent, FactionId, QTable, ReportSnapshot};

/// Moves dead agents out of the live population table.
pub trait Archiver: Send {
    /// Persist the dead rows of `population` and return it with those rows
    /// removed. Rows that could not be persisted stay in the table. Must be
    /// idempotent when there are no dead rows.
    fn archive_dead(&mut self, population: PopulationTable) -> PopulationTable;
}

/// Writes human-readable run summaries.
pub trait Reporter: Send {
    /// Persist an end-of-run report. Returns where it was written, or
    /// `None` if writing failed (already logged).
    fn save_report(&mut self, report: &ReportSnapshot) -> Option<PathBuf>;

    /// Persist a crash report for a tick that failed on `day`.
    fn save_crash_report(&mut self, day: u64, error: &str) -> Option<PathBuf>;
}

/// Durable storage of per-faction Q-tables.
pub trait BrainStore: Send {
    /// Persist every faction's table. Returns whether the write succeeded.
    fn save(&mut self, brains: &BTreeMap<FactionId, QTable>) -> bool;

    /// Load previously saved tables. Missing, unreadable or mismatched data
    /// yields an empty map.
    fn load(&mut self) -> BTreeMap<FactionId, QTable>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// In-memory archiver
// ---------------------------------------------------------------------------

/// Archiver that keeps removed rows in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryArchiver {
    inner: Arc<Mutex<ArchiveLog>>,
}

#[derive(Debug, Default)]
struct ArchiveLog {
    rows: Vec<Agent>,
    calls: u64,
}

impl MemoryArchiver {
    /// An empty archive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `archive_dead` calls so far.
    pub fn calls(&self) -> u64 {
        lock(&self.inner).calls
    }

    /// Number of rows archived so far.
    pub fn archived(&self) -> usize {
        lock(&self.inner).rows.len()
    }

    /// Copy of every archived row, oldest first.
    pub fn rows(&self) -> Vec<Agent> {
        lock(&self.inner).rows.clone()
    }
}

impl Archiver for MemoryArchiver {
    fn archive_dead(&mut self, mut population: PopulationTable) -> PopulationTable {
        let mut log = lock(&self.inner);
        log.calls = log.calls.saturating_add(1);
        let removed = population.remove_dead();
        log.rows.extend(removed);
        population
    }
}

// ---------------------------------------------------------------------------
// In-memory reporter
// ---------------------------------------------------------------------------

/// Reporter that keeps reports in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryReporter {
    inner: Arc<Mutex<ReportLog>>,
}

#[derive(Debug, Default)]
struct ReportLog {
    reports: Vec<ReportSnapshot>,
    crashes: Vec<(u64, String)>,
}

impl MemoryReporter {
    /// An empty report log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every saved report, oldest first.
    pub fn reports(&self) -> Vec<ReportSnapshot> {
        lock(&self.inner).reports.clone()
    }

    /// Every crash report as `(day, error)`, oldest first.
    pub fn crashes(&self) -> Vec<(u64, String)> {
        lock(&self.inner).crashes.clone()
    }
}

impl Reporter for MemoryReporter {
    fn save_report(&mut self, report: &ReportSnapshot) -> Option<PathBuf> {
        lock(&self.inner).reports.push(report.clone());
        None
    }

    fn save_crash_report(&mut self, day: u64, error: &str) -> Option<PathBuf> {
        lock(&self.inner).crashes.push((day, error.to_owned()));
        None
    }
}

// ---------------------------------------------------------------------------
// In-memory brain store
// ---------------------------------------------------------------------------

/// Brain store that keeps the last saved tables in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryBrainStore {
    inner: Arc<Mutex<BrainLog>>,
}

#[derive(Debug, Default)]
struct BrainLog {
    tables: BTreeMap<FactionId, QTable>,
    saves: u64,
}

impl MemoryBrainStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-loaded with tables, as if saved by an earlier process.
    pub fn with_tables(tables: BTreeMap<FactionId, QTable>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(BrainLog { tables, saves: 0 })),
        }
    }

    /// Number of saves so far.
    pub fn saves(&self) -> u64 {
        lock(&self.inner).saves
    }

    /// Copy of the last saved tables.
    pub fn tables(&self) -> BTreeMap<FactionId, QTable> {
        lock(&self.inner).tables.clone()
    }
}

impl BrainStore for MemoryBrainStore {
    fn save(&mut self, brains: &BTreeMap<FactionId, QTable>) -> bool {
        let mut log = lock(&self.inner);
        log.tables.clone_from(brains);
        log.saves = log.saves.saturating_add(1);
        true
    }

    fn load(&mut self) -> BTreeMap<FactionId, QTable> {
        lock(&self.inner).tables.clone()
    }
}
