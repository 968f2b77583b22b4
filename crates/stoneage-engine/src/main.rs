//! Engine binary for the Stone Age simulation kernel.
//!
//! Wires the file-backed stores into the kernel's collaborator traits,
//! starts the background tick loop and supervises it until a day bound is
//! reached or the engine halts.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Read process settings from the environment
//! 3. Load the kernel configuration (defaults if missing or malformed)
//! 4. Build the graveyard, report and brain-file collaborators
//! 5. Build the simulation and start the tick loop
//! 6. Supervise: status lines, day bound, halt detection
//! 7. Stop the loop and flush the faction brains

mod error;
mod persistence;
mod run_config;

use std::thread;

use stoneage_core::{Engine, KernelConfig, build_default};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::error::AppError;
use crate::persistence::{FileBrainStore, FileReporter, GraveyardArchiver, StoragePaths};
use crate::run_config::RunConfig;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if the environment is unusable, the tick thread cannot
/// be started, or the simulation halts on a failed tick.
fn main() -> Result<(), AppError> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    info!("stoneage-engine starting");

    // 2. Process settings.
    let run = RunConfig::from_env()?;

    // 3. Kernel configuration.
    let config = KernelConfig::load_or_default(&run.config_path);
    info!(
        population = config.world.initial_population,
        factions = config.world.factions.len(),
        seed = ?config.world.seed,
        tick_rate_limit = config.engine.tick_rate_limit,
        auto_restart = config.engine.auto_restart,
        max_days = ?run.max_days,
        "configuration loaded"
    );

    // 4. Collaborators.
    let paths = StoragePaths::resolve(&config.storage);
    info!(
        graveyard = %paths.graveyard.display(),
        reports = %paths.reports_dir.display(),
        brains = %paths.brains.display(),
        "storage resolved"
    );
    let archiver = GraveyardArchiver::new(paths.graveyard);
    let reporter = FileReporter::new(paths.reports_dir, paths.crash);
    let brains = FileBrainStore::new(paths.brains);

    // 5. Simulation and tick loop.
    let engine = Engine::new(build_default(
        config,
        Box::new(archiver),
        Box::new(reporter),
        Box::new(brains),
    ));
    engine.start()?;

    // 6. Supervise.
    let outcome = supervise(&engine, &run);

    // 7. Shut down.
    engine.stop();
    engine.flush();
    let (day, living, run_number) = engine.read(|state| (state.day(), state.living_count(), state.flags.run_number));
    info!(day, living, run = run_number, "stoneage-engine shutdown complete");

    outcome
}

/// Poll the engine until the day bound is reached or the loop dies.
fn supervise(engine: &Engine, run: &RunConfig) -> Result<(), AppError> {
    let mut next_status = run.status_every_days;
    loop {
        thread::sleep(run.poll_interval);

        let (day, living, run_number) = engine.read(|state| (state.day(), state.living_count(), state.flags.run_number));
        if day >= next_status {
            info!(day, living, run = run_number, speed = engine.speed(), "status");
            next_status = day.saturating_add(run.status_every_days);
        }

        if let Some(max_days) = run.max_days
            && day >= max_days
        {
            info!(day, max_days, "day bound reached");
            return Ok(());
        }

        if !engine.is_running() {
            error!(day, "tick loop halted");
            return Err(AppError::Halted { day });
        }
    }
}
