//! Tick execution: one pipeline pass per simulated day.
//!
//! [`Simulation`] bundles the world state with everything that acts on it:
//! the system pipeline and the archiver and reporter collaborators. It has
//! no notion of threads or pacing; the [`Engine`](crate::engine::Engine)
//! wraps it in a lock and drives it.
//!
//! Each call to [`Simulation::run_tick`]:
//!
//! 1. advances the clock (the season is derived from the new day),
//! 2. runs every registered system in order,
//! 3. archives the dead every `archive_interval_days`,
//! 4. checks the population against the low-water mark and, when the world
//!    has died out and auto-restart is on, replaces it with a fresh one.
//!
//! A failing system aborts the tick after step 2. The day counter keeps its
//! incremented value and nothing is rolled back.

use std::collections::BTreeSet;
use std::path::PathBuf;

use stoneage_types::{AgentId, FactionSnapshot, LogCategory, ReportSnapshot, Season};
use tracing::{debug, error, info, warn};

use crate::clock::ClockError;
use crate::collaborators::{Archiver, BrainStore, Reporter};
use crate::config::KernelConfig;
use crate::pipeline::Pipeline;
use crate::state::{RunFlags, WorldState};
use crate::systems::{BiologySystem, CultureSystem, DiseaseSystem, LeadershipSystem};

/// Report cause used when the population dies out.
pub const EXTINCTION_CAUSE: &str = "Extinction";

/// Errors that end a tick early.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A system returned an error or panicked.
    #[error("system {system} failed on day {day}: {reason}")]
    SystemFailed {
        /// Name of the failing system.
        system: &'static str,
        /// Day the tick was running.
        day: u64,
        /// Error message or panic payload.
        reason: String,
    },

    /// The clock could not advance.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// Summary of a single completed tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    /// The day that was executed.
    pub day: u64,
    /// The season of that day.
    pub season: Season,
    /// Living agents at the end of the tick, before any reset.
    pub alive: usize,
    /// Rows archived during this tick.
    pub archived: usize,
    /// Whether the world was replaced after the tick.
    pub reset: bool,
}

/// Default pipeline order: leadership, biology, disease, culture. Culture
/// runs last so its reward sees the day's health changes.
pub fn default_pipeline(config: &KernelConfig, brains: Box<dyn BrainStore>) -> Pipeline {
    Pipeline::new()
        .with(LeadershipSystem::new(config.biology.spawn.adult_age))
        .with(BiologySystem::new(config.biology.clone()))
        .with(DiseaseSystem::new(config.disease.clone()))
        .with(CultureSystem::new(config.culture.clone(), brains))
}

/// World state plus the pipeline and collaborators that advance it.
pub struct Simulation {
    config: KernelConfig,
    state: WorldState,
    pipeline: Pipeline,
    archiver: Box<dyn Archiver>,
    reporter: Box<dyn Reporter>,
    extinction_logged: bool,
}

impl core::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Simulation")
            .field("day", &self.state.day())
            .field("run", &self.state.flags.run_number)
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Assemble a simulation around an existing world.
    pub fn new(
        config: KernelConfig,
        state: WorldState,
        pipeline: Pipeline,
        archiver: Box<dyn Archiver>,
        reporter: Box<dyn Reporter>,
    ) -> Self {
        info!(
            living = state.living_count(),
            run = state.flags.run_number,
            systems = ?pipeline.names(),
            "simulation assembled"
        );
        Self {
            config,
            state,
            pipeline,
            archiver,
            reporter,
            extinction_logged: false,
        }
    }

    /// The current world.
    pub const fn state(&self) -> &WorldState {
        &self.state
    }

    /// Mutable world access between ticks (tests and tooling).
    pub const fn state_mut(&mut self) -> &mut WorldState {
        &mut self.state
    }

    /// The registered systems.
    pub const fn pipeline_mut(&mut self) -> &mut Pipeline {
        &mut self.pipeline
    }

    /// Kernel configuration in effect.
    pub const fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Turn extinction auto-restart on or off for this and later runs.
    pub const fn set_auto_restart(&mut self, enabled: bool) {
        self.state.flags.auto_restart = enabled;
    }

    /// Execute one day.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::SystemFailed`] if any system fails. The day has
    /// already advanced and the systems before the failing one have applied
    /// their changes.
    pub fn run_tick(&mut self) -> Result<TickSummary, TickError> {
        let day = self.state.clock.advance()?;
        let season = self.state.season();
        debug!(day, %season, "tick started");

        self.pipeline.run(&mut self.state)?;

        let archived = if self.state.clock.is_every(self.config.engine.archive_interval_days) {
            self.archive()
        } else {
            0
        };
        let alive = self.state.living_count();
        let reset = self.check_extinction();
        Ok(TickSummary {
            day,
            season,
            alive,
            archived,
            reset,
        })
    }

    /// Hand the dead to the archiver and drop their relation rows.
    /// Returns the number of rows removed.
    pub fn archive(&mut self) -> usize {
        let dead: BTreeSet<AgentId> = self.state.population.dead().map(|a| a.id).collect();
        let population = std::mem::take(&mut self.state.population);
        self.state.population = self.archiver.archive_dead(population);
        let removed: BTreeSet<AgentId> = dead
            .into_iter()
            .filter(|id| self.state.population.get(id).is_none())
            .collect();
        if !removed.is_empty() {
            self.state.purge_agents(&removed);
            info!(day = self.state.day(), archived = removed.len(), "dead archived");
        }
        removed.len()
    }

    /// Replace the world after a run ends.
    ///
    /// The report for the ending run is written first, then every system is
    /// told about the reset, then the state is rebuilt. Only the run flags
    /// survive. Returns the report location if it was written.
    pub fn reset(&mut self, cause: &str) -> Option<PathBuf> {
        let report = self.snapshot(cause);
        let path = self.reporter.save_report(&report);
        if path.is_none() {
            warn!(cause, "end-of-run report was not written");
        }
        self.pipeline.reset_all(&self.state);

        let flags = self.state.flags.next_run();
        let previous_day = self.state.day();
        self.state = WorldState::fresh(&self.config, flags);
        self.extinction_logged = false;
        info!(cause, previous_day, run = flags.run_number, "world reset");
        self.state.log(
            LogCategory::Extinction,
            format!(
                "A new world begins (run {}) after {} on day {previous_day}.",
                flags.run_number,
                cause.to_lowercase()
            ),
            None,
        );
        path
    }

    /// Record a failed tick through the reporter.
    pub fn record_crash(&mut self, err: &TickError) -> Option<PathBuf> {
        let day = self.state.day();
        error!(day, error = %err, "tick failed");
        self.state
            .log(LogCategory::Engine, format!("Simulation halted: {err}"), None);
        self.reporter.save_crash_report(day, &err.to_string())
    }

    /// Ask every system to persist its private state.
    pub fn flush(&mut self) {
        self.pipeline.flush_all();
    }

    /// End-of-run summary of the current world.
    pub fn snapshot(&self, cause: &str) -> ReportSnapshot {
        let state = &self.state;
        let factions = state
            .factions
            .values()
            .map(|f| FactionSnapshot {
                id: f.id.clone(),
                living: state.population.faction_members(&f.id).count(),
                food: f.food,
                chief_id: f.chief_id,
                mating_strictness: f.policy.mating_strictness(),
                rationing_strictness: f.policy.rationing_strictness(),
                mating_norm: f.policy.mating_norm(),
                rationing_norm: f.policy.rationing_norm(),
                known_states: 0,
            })
            .collect();
        let mut report = ReportSnapshot {
            day: state.day(),
            run_number: state.flags.run_number,
            cause: cause.to_owned(),
            living: state.living_count(),
            total_spawned: state.population.total_spawned(),
            archived: state.population.archived_count(),
            deaths_by_cause: state.population.deaths_by_cause(),
            diseases_emerged: 0,
            factions,
        };
        self.pipeline.contribute_to_report(&mut report);
        report
    }

    /// Apply the extinction protocol. Returns whether the world was
    /// replaced.
    fn check_extinction(&mut self) -> bool {
        let living = self.state.living_count();
        if living >= self.config.engine.low_water_mark {
            return false;
        }
        if self.state.flags.auto_restart {
            warn!(day = self.state.day(), living, "population below low-water mark, restarting");
            self.reset(EXTINCTION_CAUSE);
            return true;
        }
        if !self.extinction_logged {
            self.extinction_logged = true;
            warn!(day = self.state.day(), living, "population below low-water mark, auto-restart off");
            self.state.log(
                LogCategory::Extinction,
                format!("Only {living} people remain. The world waits for a manual restart."),
                None,
            );
        }
        false
    }
}

/// A simulation over a fresh world with the default pipeline.
pub fn build_default(
    config: KernelConfig,
    archiver: Box<dyn Archiver>,
    reporter: Box<dyn Reporter>,
    brains: Box<dyn BrainStore>,
) -> Simulation {
    let flags = RunFlags::first(config.engine.auto_restart);
    let state = WorldState::fresh(&config, flags);
    let pipeline = default_pipeline(&config, brains);
    Simulation::new(config, state, pipeline, archiver, reporter)
}
