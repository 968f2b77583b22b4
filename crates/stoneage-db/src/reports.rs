//! Human-readable run summaries and crash reports.
//!
//! Summaries go to `<reports_dir>/summary_<YYYYmmdd_HHMMSS>_<run>.txt`, one
//! per ended run. The crash report is a single file overwritten by every
//! tick failure.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use stoneage_types::ReportSnapshot;
use tracing::info;

use crate::error::DbError;

/// Writes summary and crash reports to disk.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    reports_dir: PathBuf,
    crash_path: PathBuf,
}

impl ReportWriter {
    /// A writer placing summaries in `reports_dir` and crash reports at
    /// `crash_path`.
    pub fn new(reports_dir: impl Into<PathBuf>, crash_path: impl Into<PathBuf>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
            crash_path: crash_path.into(),
        }
    }

    /// Directory summaries are written to.
    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    /// Location of the crash report.
    pub fn crash_path(&self) -> &Path {
        &self.crash_path
    }

    /// Write an end-of-run summary. Returns the file written.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Io`] if the directory or file cannot be written.
    pub fn write_summary(&self, report: &ReportSnapshot) -> Result<PathBuf, DbError> {
        let now = Local::now();
        fs::create_dir_all(&self.reports_dir).map_err(|e| DbError::io(&self.reports_dir, e))?;
        let path = self.reports_dir.join(format!(
            "summary_{}_{}.txt",
            now.format("%Y%m%d_%H%M%S"),
            report.run_number
        ));
        fs::write(&path, render_summary(report, &now)).map_err(|e| DbError::io(&path, e))?;
        info!(path = %path.display(), run = report.run_number, cause = %report.cause, "run summary written");
        Ok(path)
    }

    /// Overwrite the crash report with a failure on `day`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Io`] if the file cannot be written.
    pub fn write_crash(&self, day: u64, error: &str) -> Result<PathBuf, DbError> {
        if let Some(parent) = self.crash_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| DbError::io(parent, e))?;
        }
        let body = format!(
            "CRASH REPORT\nTime: {}\nDay: {day}\nError: {error}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        fs::write(&self.crash_path, body).map_err(|e| DbError::io(&self.crash_path, e))?;
        info!(path = %self.crash_path.display(), day, "crash report written");
        Ok(self.crash_path.clone())
    }
}

/// Render the text of a run summary.
pub fn render_summary(report: &ReportSnapshot, generated_at: &DateTime<Local>) -> String {
    let mut lines = vec![
        String::from("STONE AGE SIMULATION REPORT"),
        String::from("==========================="),
        format!("Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S")),
        format!("Run: {}", report.run_number),
        format!("Cause: {}", report.cause),
        format!("Day reached: {}", report.day),
        String::new(),
        String::from("POPULATION"),
        String::from("----------"),
        format!("Living: {}", report.living),
        format!("Total spawned: {}", report.total_spawned),
        format!("Total deaths: {}", report.total_deaths()),
        format!("Archived: {}", report.archived),
        format!("Diseases emerged: {}", report.diseases_emerged),
        String::new(),
        String::from("DEATHS BY CAUSE"),
        String::from("---------------"),
    ];
    if report.deaths_by_cause.is_empty() {
        lines.push(String::from("(none)"));
    }
    lines.extend(
        report
            .deaths_by_cause
            .iter()
            .map(|(cause, count)| format!("{cause}: {count}")),
    );

    lines.push(String::new());
    lines.push(String::from("FACTIONS"));
    lines.push(String::from("--------"));
    for faction in &report.factions {
        let chief = faction
            .chief_id
            .map_or_else(|| String::from("none"), |id| id.short());
        lines.push(faction.id.display_name());
        lines.push(format!("  Living: {}", faction.living));
        lines.push(format!("  Food: {:.1}", faction.food));
        lines.push(format!("  Chief: {chief}"));
        lines.push(format!(
            "  Mating: {} ({:.2})",
            faction.mating_norm, faction.mating_strictness
        ));
        lines.push(format!(
            "  Rationing: {} ({:.2})",
            faction.rationing_norm, faction.rationing_strictness
        ));
        lines.push(format!("  Known states: {}", faction.known_states));
    }
    lines.push(String::new());
    lines.join("\n")
}
