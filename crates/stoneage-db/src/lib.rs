//! File-backed persistence for the Stone Age simulation kernel.
//!
//! The kernel keeps the live world in memory. This crate owns everything
//! that outlives a tick on disk:
//!
//! ```text
//! <data_dir>/
//!     |-- archive/graveyard.csv   (GraveyardStore, append-only dead rows)
//!     |-- reports/summary_*.txt   (ReportWriter, one per ended run)
//!     |-- crash.log               (ReportWriter, last tick failure)
//!     +-- faction_brains.json     (BrainFile, per-faction Q-tables)
//! ```
//!
//! Every store returns [`DbError`]; deciding whether a failure matters is
//! left to the caller.
//!
//! # Modules
//!
//! - [`graveyard`] -- Append-only CSV archive of dead agents
//! - [`reports`] -- Run summaries and crash reports
//! - [`brains`] -- Versioned JSON file of faction Q-tables
//! - [`error`] -- Shared error types

pub mod brains;
pub mod error;
pub mod graveyard;
pub mod reports;

// Re-export primary types for convenience.
pub use brains::{BRAIN_FILE_VERSION, BrainFile};
pub use error::DbError;
pub use graveyard::{GRAVEYARD_COLUMNS, GraveyardStore};
pub use reports::ReportWriter;
