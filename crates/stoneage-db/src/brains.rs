//! Versioned JSON file of per-faction Q-tables.
//!
//! Layout:
//!
//! ```text
//! {
//!   "version": 1,
//!   "actions": 9,
//!   "factions": {
//!     "red_tribe": [ { "state": { ... }, "values": [ 9 numbers ] }, ... ]
//!   }
//! }
//! ```
//!
//! Writes go through a sibling temp file and a rename, so a crash mid-write
//! leaves the previous file intact. Loads validate the version, the action
//! count and every value row before anything is returned.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use stoneage_types::{ACTION_COUNT, FactionId, QTable, StateKey};
use tracing::debug;

use crate::error::DbError;

/// Layout version written into every brain file.
pub const BRAIN_FILE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct BrainDocument {
    version: u32,
    actions: usize,
    factions: BTreeMap<String, Vec<BrainEntry>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct BrainEntry {
    state: StateKey,
    values: Vec<f64>,
}

/// JSON file holding every faction's Q-table.
#[derive(Debug, Clone)]
pub struct BrainFile {
    path: PathBuf,
}

impl BrainFile {
    /// A brain file at `path`. Nothing is touched until the first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write every table, replacing the previous file atomically.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialization`] if encoding fails, or
    /// [`DbError::Io`] if the temp file cannot be written or renamed.
    pub fn save(&self, brains: &BTreeMap<FactionId, QTable>) -> Result<(), DbError> {
        let document = BrainDocument {
            version: BRAIN_FILE_VERSION,
            actions: ACTION_COUNT,
            factions: brains
                .iter()
                .map(|(faction, table)| {
                    let entries = table
                        .iter()
                        .map(|(state, values)| BrainEntry {
                            state: *state,
                            values: values.to_vec(),
                        })
                        .collect();
                    (faction.as_str().to_owned(), entries)
                })
                .collect(),
        };
        let json = serde_json::to_string_pretty(&document)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| DbError::io(parent, e))?;
        }
        let temp = self.temp_path();
        fs::write(&temp, json).map_err(|e| DbError::io(&temp, e))?;
        fs::rename(&temp, &self.path).map_err(|e| DbError::io(&self.path, e))?;

        debug!(path = %self.path.display(), factions = brains.len(), "faction brains saved");
        Ok(())
    }

    /// Read every table. A missing file yields an empty map.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Io`] if the file exists but cannot be read,
    /// [`DbError::Serialization`] if it is not valid JSON of the expected
    /// shape, or [`DbError::Schema`] on a version or action-count mismatch
    /// or a malformed value row.
    pub fn load(&self) -> Result<BTreeMap<FactionId, QTable>, DbError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(DbError::io(&self.path, e)),
        };
        let document: BrainDocument = serde_json::from_str(&contents)?;

        if document.version != BRAIN_FILE_VERSION {
            return Err(self.schema(format!(
                "version {} (expected {BRAIN_FILE_VERSION})",
                document.version
            )));
        }
        if document.actions != ACTION_COUNT {
            return Err(self.schema(format!(
                "{} actions (expected {ACTION_COUNT})",
                document.actions
            )));
        }

        let mut brains = BTreeMap::new();
        for (faction, entries) in document.factions {
            let mut table = QTable::new();
            for entry in entries {
                let values: [f64; ACTION_COUNT] = entry.values.try_into().map_err(|v: Vec<f64>| {
                    self.schema(format!("{faction}: row of {} values", v.len()))
                })?;
                if values.iter().any(|v| !v.is_finite()) {
                    return Err(self.schema(format!("{faction}: non-finite value")));
                }
                table.insert(entry.state, values);
            }
            brains.insert(FactionId::new(faction), table);
        }
        debug!(path = %self.path.display(), factions = brains.len(), "faction brains loaded");
        Ok(brains)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn schema(&self, reason: String) -> DbError {
        DbError::Schema {
            path: self.path.clone(),
            reason,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn temp_path_is_a_sibling() {
        let file = BrainFile::new("data/faction_brains.json");
        assert_eq!(file.temp_path(), PathBuf::from("data/faction_brains.json.tmp"));
    }
}
