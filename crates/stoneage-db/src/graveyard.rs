//! Append-only CSV archive of dead agents.
//!
//! The header row is written only when the file does not exist yet, so a
//! graveyard accumulates rows across runs and process restarts. Fields that
//! contain a separator, quote or newline are quoted with doubled quotes.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};

use stoneage_types::Agent;
use tracing::debug;

use crate::error::DbError;

/// Column names, in write order.
pub const GRAVEYARD_COLUMNS: [&str; 20] = [
    "id",
    "faction_id",
    "family_id",
    "mother_id",
    "father_id",
    "sex",
    "role",
    "age",
    "born_on_day",
    "died_on_day",
    "cause_of_death",
    "max_hp",
    "max_stamina",
    "genetic_vulnerability",
    "openness",
    "conscientiousness",
    "extraversion",
    "agreeableness",
    "neuroticism",
    "schema_version",
];

/// CSV file that dead rows are appended to.
#[derive(Debug, Clone)]
pub struct GraveyardStore {
    path: PathBuf,
}

impl GraveyardStore {
    /// A store writing to `path`. Nothing is touched until the first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the CSV file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row per agent, creating the file (with header) and its
    /// parent directory if needed. Returns the number of rows written.
    ///
    /// An empty slice is a no-op and does not create the file.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Io`] if the directory or file cannot be created or
    /// written. Rows are buffered and flushed together, so on error none of
    /// them should be considered persisted.
    pub fn append(&self, agents: &[Agent]) -> Result<usize, DbError> {
        if agents.is_empty() {
            return Ok(0);
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| DbError::io(parent, e))?;
        }

        let is_new = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| DbError::io(&self.path, e))?;

        let mut out = String::new();
        if is_new {
            out.push_str(&GRAVEYARD_COLUMNS.join(","));
            out.push('\n');
        }
        for agent in agents {
            out.push_str(&encode_row(agent));
            out.push('\n');
        }

        let mut writer = BufWriter::new(file);
        writer
            .write_all(out.as_bytes())
            .and_then(|()| writer.flush())
            .map_err(|e| DbError::io(&self.path, e))?;

        debug!(path = %self.path.display(), rows = agents.len(), header = is_new, "graveyard rows appended");
        Ok(agents.len())
    }
}

/// Render one agent as a CSV line without the trailing newline.
pub fn encode_row(agent: &Agent) -> String {
    let optional = |value: Option<String>| value.unwrap_or_default();
    let fields = [
        agent.id.to_string(),
        agent.faction_id.to_string(),
        agent.family_id.to_string(),
        optional(agent.mother_id.as_ref().map(ToString::to_string)),
        optional(agent.father_id.as_ref().map(ToString::to_string)),
        format!("{:?}", agent.sex),
        format!("{:?}", agent.role),
        format!("{:.3}", agent.age),
        agent.born_on_day.to_string(),
        optional(agent.died_on_day().as_ref().map(ToString::to_string)),
        optional(agent.cause_of_death().as_ref().map(ToString::to_string)),
        format!("{:.1}", agent.max_hp),
        format!("{:.1}", agent.max_stamina),
        format!("{:.4}", agent.genetic_vulnerability),
        format!("{:.4}", agent.personality.openness),
        format!("{:.4}", agent.personality.conscientiousness),
        format!("{:.4}", agent.personality.extraversion),
        format!("{:.4}", agent.personality.agreeableness),
        format!("{:.4}", agent.personality.neuroticism),
        agent.schema_version.to_string(),
    ];

    let mut line = String::new();
    for (idx, field) in fields.iter().enumerate() {
        if idx > 0 {
            line.push(',');
        }
        line.push_str(&quote(field));
    }
    line
}

/// Quote a field if it contains a separator, quote or line break.
pub fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_owned()
    }
}
