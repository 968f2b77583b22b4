//! Configuration loading and typed config structures for the kernel.
//!
//! The configuration lives in `stoneage-config.yaml`. This module defines
//! strongly-typed structs that mirror the YAML structure and a loader that
//! never fails: a missing or malformed file degrades to defaults with a
//! warning, and obviously invalid values are replaced by their defaults.

use std::path::Path;

use serde::Deserialize;
use stoneage_agents::{SpawnConfig, VitalsConfig};
use tracing::{info, warn};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level kernel configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct KernelConfig {
    /// World creation settings.
    #[serde(default)]
    pub world: WorldConfig,

    /// Tick engine settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Contagion model parameters.
    #[serde(default)]
    pub disease: DiseaseConfig,

    /// Per-faction learner parameters.
    #[serde(default)]
    pub culture: CultureConfig,

    /// Vitals, foraging and reproduction parameters.
    #[serde(default)]
    pub biology: BiologyConfig,

    /// On-disk locations for persisted data.
    #[serde(default)]
    pub storage: StorageConfig,
}

impl KernelConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config.validated())
    }

    /// Load from `path`, falling back to defaults when the file is missing,
    /// unreadable or malformed.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            info!(path = %path.display(), "no config file found, using defaults");
            return Self::default();
        }
        match Self::from_file(path) {
            Ok(config) => {
                info!(path = %path.display(), "loaded configuration");
                config
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "config unusable, using defaults");
                Self::default()
            }
        }
    }

    /// Replace obviously invalid values with their defaults, warning for each.
    pub fn validated(mut self) -> Self {
        let engine_defaults = EngineConfig::default();
        if self.engine.tick_rate_limit == 0 {
            warn!("engine.tick_rate_limit must be positive, using default");
            self.engine.tick_rate_limit = engine_defaults.tick_rate_limit;
        }
        if !(self.engine.min_speed.is_finite() && self.engine.min_speed > 0.0)
            || !(self.engine.max_speed.is_finite() && self.engine.max_speed >= self.engine.min_speed)
        {
            warn!("engine speed bounds invalid, using defaults");
            self.engine.min_speed = engine_defaults.min_speed;
            self.engine.max_speed = engine_defaults.max_speed;
        }
        if !self.engine.speed.is_finite() || self.engine.speed <= 0.0 {
            warn!("engine.speed must be positive, using default");
            self.engine.speed = engine_defaults.speed;
        }
        self.engine.speed = self.engine.speed.clamp(self.engine.min_speed, self.engine.max_speed);
        if self.engine.archive_interval_days == 0 {
            warn!("engine.archive_interval_days must be positive, using default");
            self.engine.archive_interval_days = engine_defaults.archive_interval_days;
        }

        let culture_defaults = CultureConfig::default();
        for (name, value, default) in [
            ("alpha", &mut self.culture.alpha, culture_defaults.alpha),
            ("gamma", &mut self.culture.gamma, culture_defaults.gamma),
            ("epsilon", &mut self.culture.epsilon, culture_defaults.epsilon),
        ] {
            if !(0.0..=1.0).contains(&*value) {
                warn!(key = name, "culture rate outside [0, 1], using default");
                *value = default;
            }
        }
        if self.culture.cadence_days == 0 {
            warn!("culture.cadence_days must be positive, using default");
            self.culture.cadence_days = culture_defaults.cadence_days;
        }

        if self.world.factions.is_empty() {
            warn!("world.factions is empty, using default factions");
            self.world.factions = default_factions();
        }
        self
    }
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// World creation settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorldConfig {
    /// Founders spawned at world creation, spread over the factions.
    #[serde(default = "default_initial_population")]
    pub initial_population: u32,

    /// Random seed. Absent means seed from entropy.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Faction identifiers, in display order.
    #[serde(default = "default_factions")]
    pub factions: Vec<String>,

    /// Food placed in each faction store per founding member.
    #[serde(default = "default_starting_food_per_agent")]
    pub starting_food_per_agent: f64,

    /// Chronicle capacity in entries.
    #[serde(default = "default_chronicle_capacity")]
    pub chronicle_capacity: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            initial_population: default_initial_population(),
            seed: None,
            factions: default_factions(),
            starting_food_per_agent: default_starting_food_per_agent(),
            chronicle_capacity: default_chronicle_capacity(),
        }
    }
}

const fn default_initial_population() -> u32 {
    300
}

fn default_factions() -> Vec<String> {
    vec![
        String::from("red_tribe"),
        String::from("blue_tribe"),
        String::from("green_tribe"),
    ]
}

const fn default_starting_food_per_agent() -> f64 {
    30.0
}

const fn default_chronicle_capacity() -> usize {
    crate::chronicle::DEFAULT_CHRONICLE_CAPACITY
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Tick engine settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// Ticks per second at speed 1.0.
    #[serde(default = "default_tick_rate_limit")]
    pub tick_rate_limit: u32,

    /// Initial speed multiplier.
    #[serde(default = "default_speed")]
    pub speed: f64,

    /// Lowest accepted speed multiplier.
    #[serde(default = "default_min_speed")]
    pub min_speed: f64,

    /// Highest accepted speed multiplier.
    #[serde(default = "default_max_speed")]
    pub max_speed: f64,

    /// Days between archiver passes.
    #[serde(default = "default_archive_interval_days")]
    pub archive_interval_days: u64,

    /// A living count below this triggers the extinction protocol.
    #[serde(default = "default_low_water_mark")]
    pub low_water_mark: usize,

    /// Whether extinction replaces the world with a fresh one.
    #[serde(default = "default_true")]
    pub auto_restart: bool,

    /// Poll interval of the background loop while paused.
    #[serde(default = "default_paused_poll_ms")]
    pub paused_poll_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_rate_limit: default_tick_rate_limit(),
            speed: default_speed(),
            min_speed: default_min_speed(),
            max_speed: default_max_speed(),
            archive_interval_days: default_archive_interval_days(),
            low_water_mark: default_low_water_mark(),
            auto_restart: true,
            paused_poll_ms: default_paused_poll_ms(),
        }
    }
}

const fn default_tick_rate_limit() -> u32 {
    20
}

const fn default_speed() -> f64 {
    1.0
}

const fn default_min_speed() -> f64 {
    0.1
}

const fn default_max_speed() -> f64 {
    50.0
}

const fn default_archive_interval_days() -> u64 {
    30
}

const fn default_low_water_mark() -> usize {
    2
}

const fn default_paused_poll_ms() -> u64 {
    100
}

const fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Disease
// ---------------------------------------------------------------------------

/// Contagion model parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DiseaseConfig {
    /// Daily outbreak chance before the population term.
    pub outbreak_base_chance: f64,
    /// Daily outbreak chance added per living agent.
    pub outbreak_chance_per_agent: f64,
    /// Ceiling of the daily outbreak chance.
    pub max_outbreak_chance: f64,
    /// No outbreaks below this living count.
    pub min_outbreak_population: usize,
    /// Ceiling of the aggregate daily infection probability.
    pub transmission_cap: f64,
    /// Immunity lost per day by waning and sensitizing records.
    pub immunity_decay: f64,
    /// Immunity gained on recovering from a waning disease.
    pub recovery_boost: f64,
    /// Immunity gained on recovering from a sensitizing disease.
    pub sensitizing_boost: f64,
    /// Extra damage multiplier per prior exposure to a sensitizing disease.
    pub sensitizing_damage_step: f64,
    /// Daily reactivation chance of a dormant infection in a weak host.
    pub reactivation_chance: f64,
    /// A host below this hit-point fraction is weak.
    pub weak_hp_fraction: f64,
    /// A host below this stamina is weak.
    pub weak_stamina: f64,
    /// A host older than this is weak.
    pub weak_age: f64,
    /// Lethality rolls apply to hosts below this hit-point fraction.
    pub lethality_hp_fraction: f64,
}

impl Default for DiseaseConfig {
    fn default() -> Self {
        Self {
            outbreak_base_chance: 0.001,
            outbreak_chance_per_agent: 0.000_02,
            max_outbreak_chance: 0.05,
            min_outbreak_population: 10,
            transmission_cap: 0.5,
            immunity_decay: 0.002,
            recovery_boost: 0.8,
            sensitizing_boost: 0.3,
            sensitizing_damage_step: 0.5,
            reactivation_chance: 0.02,
            weak_hp_fraction: 0.3,
            weak_stamina: 20.0,
            weak_age: 60.0,
            lethality_hp_fraction: 0.5,
        }
    }
}

// ---------------------------------------------------------------------------
// Culture
// ---------------------------------------------------------------------------

/// Per-faction learner parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CultureConfig {
    /// Learning rate.
    pub alpha: f64,
    /// Discount factor per decision.
    pub gamma: f64,
    /// Exploration rate.
    pub epsilon: f64,
    /// Days between decisions.
    pub cadence_days: u64,
    /// Days between Q-table saves.
    pub save_interval_days: u64,
    /// Slider change per non-zero action component.
    pub slider_step: f64,
    /// Headcount below this is `CRITICAL`.
    pub critical_population: usize,
    /// Headcount below this (and not critical) is `LOW`.
    pub low_population: usize,
    /// Mean vulnerability below this is `PURE`.
    pub pure_vulnerability: f64,
    /// Mean vulnerability below this (and not pure) is `MIXED`.
    pub mixed_vulnerability: f64,
    /// Food per capita below this is `FAMINE`.
    pub famine_food: f64,
    /// Food per capita below this (and not famine) is `SCARCE`.
    pub scarce_food: f64,
    /// Reward for surviving a decision interval.
    pub survival_reward: f64,
    /// Reward when the faction has no living members.
    pub extinction_reward: f64,
    /// Mean vulnerability above this costs `high_vulnerability_penalty`.
    pub high_vulnerability: f64,
    /// Penalty for high mean vulnerability.
    pub high_vulnerability_penalty: f64,
    /// Mean vulnerability above this costs `moderate_vulnerability_penalty`.
    pub moderate_vulnerability: f64,
    /// Penalty for moderate mean vulnerability.
    pub moderate_vulnerability_penalty: f64,
    /// Food per capita below this costs `hunger_penalty`.
    pub hunger_food: f64,
    /// Penalty for hunger.
    pub hunger_penalty: f64,
    /// Mean hit-point fraction below this costs `weak_penalty`.
    pub weak_hp_fraction: f64,
    /// Penalty for weak members.
    pub weak_penalty: f64,
    /// Mean hit-point fraction below this costs `frail_penalty` instead.
    pub frail_hp_fraction: f64,
    /// Penalty for frail members.
    pub frail_penalty: f64,
}

impl Default for CultureConfig {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            gamma: 0.95,
            epsilon: 0.2,
            cadence_days: 7,
            save_interval_days: 30,
            slider_step: 0.1,
            critical_population: 50,
            low_population: 200,
            pure_vulnerability: 0.2,
            mixed_vulnerability: 0.5,
            famine_food: 5.0,
            scarce_food: 20.0,
            survival_reward: 1.0,
            extinction_reward: -100.0,
            high_vulnerability: 0.5,
            high_vulnerability_penalty: -5.0,
            moderate_vulnerability: 0.3,
            moderate_vulnerability_penalty: -1.0,
            hunger_food: 2.0,
            hunger_penalty: -2.0,
            weak_hp_fraction: 0.5,
            weak_penalty: -2.0,
            frail_hp_fraction: 0.25,
            frail_penalty: -4.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Biology
// ---------------------------------------------------------------------------

/// Vitals, foraging and reproduction parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BiologyConfig {
    /// Daily vital mechanics.
    pub vitals: VitalsConfig,
    /// Founder and newborn generation.
    pub spawn: SpawnConfig,
    /// Food one agent eats per day.
    pub ration_per_agent: f64,
    /// Base daily yield of a gatherer.
    pub forage_yield: f64,
    /// Base daily yield of a hunter.
    pub hunt_yield: f64,
    /// Yield multipliers for Spring, Summer, Autumn and Winter.
    pub season_multipliers: [f64; 4],
    /// Foraging skill gained per day of work, as a fraction of the gap to 1.
    pub skill_practice_rate: f64,
    /// Yield bonus for holding a stone tool.
    pub tool_bonus: f64,
    /// Daily chance a used stone tool breaks.
    pub tool_wear_chance: f64,
    /// Hit points a healer restores per day, before the healing skill bonus.
    pub healer_heal: f64,
    /// Days from conception to birth.
    pub gestation_days: u32,
    /// Youngest age at which agents pair and conceive.
    pub fertility_min_age: f64,
    /// Oldest age at which agents pair and conceive.
    pub fertility_max_age: f64,
    /// Daily chance a single eligible female looks for a partner.
    pub pairing_chance: f64,
    /// Daily conception chance of a bonded, fertile female.
    pub conception_chance: f64,
    /// Chance the mother dies giving birth.
    pub childbirth_mortality: f64,
    /// No conceptions while the living count is at or above this.
    pub max_population: usize,
}

impl Default for BiologyConfig {
    fn default() -> Self {
        Self {
            vitals: VitalsConfig::default(),
            spawn: SpawnConfig::default(),
            ration_per_agent: 1.0,
            forage_yield: 1.3,
            hunt_yield: 1.6,
            season_multipliers: [1.0, 1.2, 1.1, 0.4],
            skill_practice_rate: 0.01,
            tool_bonus: 0.1,
            tool_wear_chance: 0.005,
            healer_heal: 2.0,
            gestation_days: 270,
            fertility_min_age: 16.0,
            fertility_max_age: 45.0,
            pairing_chance: 0.02,
            conception_chance: 0.01,
            childbirth_mortality: 0.01,
            max_population: 2000,
        }
    }
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// On-disk locations for persisted data, relative to `data_dir`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory of all persisted data.
    pub data_dir: String,
    /// Graveyard CSV, relative to `data_dir`.
    pub graveyard_file: String,
    /// Report directory, relative to `data_dir`.
    pub reports_dir: String,
    /// Q-table file, relative to `data_dir`.
    pub brain_file: String,
    /// Crash report file, relative to `data_dir`.
    pub crash_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: String::from("data"),
            graveyard_file: String::from("archive/graveyard.csv"),
            reports_dir: String::from("reports"),
            brain_file: String::from("faction_brains.json"),
            crash_file: String::from("crash.log"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = KernelConfig::default();
        assert_eq!(config.world.initial_population, 300);
        assert_eq!(config.world.factions.len(), 3);
        assert_eq!(config.engine.tick_rate_limit, 20);
        assert_eq!(config.engine.archive_interval_days, 30);
        assert_eq!(config.culture.cadence_days, 7);
        assert!((config.disease.transmission_cap - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.biology.gestation_days, 270);
    }

    #[test]
    fn parse_partial_yaml() {
        let yaml = r"
world:
  initial_population: 40
  seed: 9
  factions: [wolves, ravens]
engine:
  auto_restart: false
culture:
  epsilon: 0.05
biology:
  vitals:
    starvation_damage: 7.5
";
        let config = KernelConfig::parse(yaml).unwrap();
        assert_eq!(config.world.initial_population, 40);
        assert_eq!(config.world.seed, Some(9));
        assert_eq!(config.world.factions, vec!["wolves", "ravens"]);
        assert!(!config.engine.auto_restart);
        assert_eq!(config.engine.tick_rate_limit, 20);
        assert!((config.culture.epsilon - 0.05).abs() < f64::EPSILON);
        assert!((config.culture.alpha - 0.1).abs() < f64::EPSILON);
        assert!((config.biology.vitals.starvation_damage - 7.5).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let yaml = r"
world:
  factions: []
engine:
  tick_rate_limit: 0
  speed: -3.0
culture:
  epsilon: 4.0
";
        let config = KernelConfig::parse(yaml).unwrap();
        assert_eq!(config.engine.tick_rate_limit, 20);
        assert!((config.engine.speed - 1.0).abs() < f64::EPSILON);
        assert!((config.culture.epsilon - 0.2).abs() < f64::EPSILON);
        assert_eq!(config.world.factions.len(), 3);
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        assert!(matches!(
            KernelConfig::parse("world: [unclosed"),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn missing_file_loads_defaults() {
        let path = std::env::temp_dir().join("stoneage-config-that-does-not-exist.yaml");
        assert_eq!(KernelConfig::load_or_default(&path), KernelConfig::default());
    }
}
