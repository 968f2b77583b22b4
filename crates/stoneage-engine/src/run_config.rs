//! Process-level settings loaded from environment variables.
//!
//! The kernel itself is configured from `stoneage-config.yaml`; these only
//! decide where that file lives and how long this process drives the engine.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

/// Settings of one engine process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Kernel configuration file.
    pub config_path: PathBuf,
    /// Stop once the world reaches this day. Runs until halted when absent.
    pub max_days: Option<u64>,
    /// How often the supervisor checks on the engine.
    pub poll_interval: Duration,
    /// Days between status lines.
    pub status_every_days: u64,
}

impl RunConfig {
    /// Load settings from the environment.
    ///
    /// Optional variables:
    /// - `STONEAGE_CONFIG` -- kernel config path (default `stoneage-config.yaml`)
    /// - `STONEAGE_MAX_DAYS` -- day bound for this process (default unbounded)
    /// - `STONEAGE_POLL_MS` -- supervisor poll interval in milliseconds (default 250)
    /// - `STONEAGE_STATUS_DAYS` -- days between status lines (default 365)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let config_path = lookup("STONEAGE_CONFIG")
            .map_or_else(|| PathBuf::from("stoneage-config.yaml"), PathBuf::from);

        let max_days = lookup("STONEAGE_MAX_DAYS")
            .map(|raw| parse_u64("STONEAGE_MAX_DAYS", &raw))
            .transpose()?;

        let poll_ms = lookup("STONEAGE_POLL_MS")
            .map(|raw| parse_u64("STONEAGE_POLL_MS", &raw))
            .transpose()?
            .unwrap_or(250)
            .max(1);

        let status_every_days = lookup("STONEAGE_STATUS_DAYS")
            .map(|raw| parse_u64("STONEAGE_STATUS_DAYS", &raw))
            .transpose()?
            .unwrap_or(365)
            .max(1);

        Ok(Self {
            config_path,
            max_days,
            poll_interval: Duration::from_millis(poll_ms),
            status_every_days,
        })
    }
}

fn parse_u64(name: &str, raw: &str) -> Result<u64, AppError> {
    raw.trim()
        .parse()
        .map_err(|e| AppError::Config(format!("invalid {name}: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<RunConfig, AppError> {
        let vars: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        RunConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.config_path, PathBuf::from("stoneage-config.yaml"));
        assert_eq!(config.max_days, None);
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.status_every_days, 365);
    }

    #[test]
    fn reads_overrides() {
        let config = load(&[
            ("STONEAGE_CONFIG", "/etc/stoneage.yaml"),
            ("STONEAGE_MAX_DAYS", "3650"),
            ("STONEAGE_POLL_MS", "0"),
        ])
        .unwrap();
        assert_eq!(config.config_path, PathBuf::from("/etc/stoneage.yaml"));
        assert_eq!(config.max_days, Some(3650));
        assert_eq!(config.poll_interval, Duration::from_millis(1));
    }

    #[test]
    fn rejects_garbage_numbers() {
        assert!(matches!(
            load(&[("STONEAGE_MAX_DAYS", "forever")]),
            Err(AppError::Config(_))
        ));
    }
}
