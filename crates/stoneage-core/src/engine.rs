//! The background tick engine.
//!
//! [`Engine`] is a cloneable handle over one [`Simulation`] behind a mutex
//! plus lock-free [`OperatorState`]. Every tick runs to completion while
//! holding the world lock, so a reader that takes the same lock through
//! [`Engine::read`] sees either all of a tick or none of it.
//!
//! Control operations (pause, resume, speed) are atomics and never touch
//! the world lock. Multi-day skips take the lock once and run the ticks
//! back to back. No public operation re-enters the lock while holding it,
//! which is what makes a plain [`std::sync::Mutex`] sufficient.
//!
//! # Crash containment
//!
//! A failing tick is recorded through the reporter, the engine pauses, the
//! background loop exits and [`Engine::is_running`] turns false. The state
//! is left exactly as the failed tick left it; restarting is up to the
//! caller.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use stoneage_types::FactionId;
use tracing::{debug, error, info, warn};

use crate::operator::OperatorState;
use crate::simulation::{Simulation, TickError, TickSummary};
use crate::state::WorldState;
use crate::systems::CultureSystem;

/// Name of the background tick thread.
const TICK_THREAD_NAME: &str = "stoneage-tick";

/// Errors surfaced by engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A tick failed; the engine has halted.
    #[error("tick failed: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },

    /// The background thread could not be spawned.
    #[error("failed to spawn tick thread: {source}")]
    Spawn {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

#[derive(Debug)]
struct Shared {
    simulation: Mutex<Simulation>,
    operator: OperatorState,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Simulation> {
        self.simulation.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run one tick on an already locked simulation, halting on failure.
    fn tick_locked(&self, simulation: &mut Simulation) -> Result<TickSummary, EngineError> {
        match simulation.run_tick() {
            Ok(summary) => Ok(summary),
            Err(err) => {
                self.halt(simulation, &err);
                Err(err.into())
            }
        }
    }

    fn halt(&self, simulation: &mut Simulation, err: &TickError) {
        let report = simulation.record_crash(err);
        self.operator.pause();
        self.operator.request_stop();
        self.operator.set_running(false);
        error!(
            day = simulation.state().day(),
            error = %err,
            crash_report = ?report,
            "engine halted"
        );
    }

    fn run_loop(&self) {
        info!(rate = self.operator.tick_rate_limit(), speed = self.operator.speed(), "tick loop started");
        while !self.operator.is_stop_requested() {
            if self.operator.is_paused() {
                thread::sleep(self.operator.paused_poll());
                continue;
            }
            let started = Instant::now();
            let outcome = {
                let mut simulation = self.lock();
                self.tick_locked(&mut simulation)
            };
            match outcome {
                Ok(summary) => debug!(day = summary.day, alive = summary.alive, "tick complete"),
                Err(_) => break,
            }
            if let Some(rest) = self.operator.target_interval().checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }
        self.operator.set_running(false);
        info!("tick loop stopped");
    }
}

/// Cloneable handle to a running or idle simulation.
#[derive(Debug, Clone)]
pub struct Engine {
    shared: Arc<Shared>,
}

impl Engine {
    /// Wrap a simulation. The loop is not started.
    pub fn new(simulation: Simulation) -> Self {
        let operator = OperatorState::new(&simulation.config().engine);
        Self {
            shared: Arc::new(Shared {
                simulation: Mutex::new(simulation),
                operator,
                worker: Mutex::new(None),
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Stepping
    // -----------------------------------------------------------------------

    /// Advance one day. While paused this does nothing unless `force` is
    /// set. Returns the summary of the tick that ran, if any.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Tick`] if the tick failed. The engine is
    /// halted by then.
    pub fn step(&self, force: bool) -> Result<Option<TickSummary>, EngineError> {
        if !force && self.shared.operator.is_paused() {
            return Ok(None);
        }
        let mut simulation = self.shared.lock();
        self.shared.tick_locked(&mut simulation).map(Some)
    }

    /// Run `days` ticks under a single lock acquisition, ignoring pause and
    /// the rate limiter. Returns the last summary, if any tick ran.
    ///
    /// # Errors
    ///
    /// Stops at the first failing tick and returns [`EngineError::Tick`].
    pub fn skip_days(&self, days: u64) -> Result<Option<TickSummary>, EngineError> {
        let mut simulation = self.shared.lock();
        let mut last = None;
        for _ in 0..days {
            last = Some(self.shared.tick_locked(&mut simulation)?);
        }
        info!(days, day = simulation.state().day(), "skipped days");
        Ok(last)
    }

    // -----------------------------------------------------------------------
    // Background loop
    // -----------------------------------------------------------------------

    /// Start the background loop. Returns `false` if it was already
    /// running.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Spawn`] if the thread could not be created.
    pub fn start(&self) -> Result<bool, EngineError> {
        let mut worker = self.shared.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if self.shared.operator.is_running() && worker.is_some() {
            return Ok(false);
        }
        if let Some(previous) = worker.take() {
            join_worker(previous);
        }
        self.shared.operator.clear_stop();
        self.shared.operator.set_running(true);
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(TICK_THREAD_NAME.to_owned())
            .spawn(move || shared.run_loop());
        match spawned {
            Ok(handle) => {
                *worker = Some(handle);
                Ok(true)
            }
            Err(err) => {
                self.shared.operator.set_running(false);
                warn!(error = %err, "could not spawn tick thread");
                Err(err.into())
            }
        }
    }

    /// Stop the background loop and wait for it to exit.
    pub fn stop(&self) {
        self.shared.operator.request_stop();
        let handle = self
            .shared
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            join_worker(handle);
        }
        self.shared.operator.set_running(false);
    }

    // -----------------------------------------------------------------------
    // Controls
    // -----------------------------------------------------------------------

    /// Pause the loop. A forced step still runs.
    pub fn pause(&self) {
        self.shared.operator.pause();
    }

    /// Resume the loop.
    pub fn resume(&self) {
        self.shared.operator.resume();
    }

    /// Flip pause. Returns whether the engine is now paused.
    pub fn toggle_pause(&self) -> bool {
        self.shared.operator.toggle_pause()
    }

    /// Change the speed multiplier. Returns the previous speed, or `None`
    /// if `speed` was rejected.
    pub fn set_speed(&self, speed: f64) -> Option<f64> {
        self.shared.operator.set_speed(speed)
    }

    /// Current speed multiplier.
    pub fn speed(&self) -> f64 {
        self.shared.operator.speed()
    }

    /// Whether the engine is paused.
    pub fn is_paused(&self) -> bool {
        self.shared.operator.is_paused()
    }

    /// Whether the background loop is alive.
    pub fn is_running(&self) -> bool {
        self.shared.operator.is_running()
    }

    /// Ticks per second at speed 1.0.
    pub fn tick_rate_limit(&self) -> u32 {
        self.shared.operator.tick_rate_limit()
    }

    // -----------------------------------------------------------------------
    // State access
    // -----------------------------------------------------------------------

    /// Read the world between ticks.
    ///
    /// # Deadlocks
    ///
    /// `f` runs under the world lock, which is not reentrant. Calling
    /// [`Engine::step`], [`Engine::skip_days`], [`Engine::reset`],
    /// [`Engine::flush`], [`Engine::reset_faction_brain`] or another `read`
    /// from inside `f` blocks forever. The atomic controls (pause, resume,
    /// speed) are safe to call.
    pub fn read<R>(&self, f: impl FnOnce(&WorldState) -> R) -> R {
        f(self.shared.lock().state())
    }

    /// Exclusive access to the whole simulation between ticks.
    ///
    /// # Deadlocks
    ///
    /// Holds the same non-reentrant lock as [`Engine::read`]; the same
    /// calls must not be made from inside `f`. Use the `&mut Simulation`
    /// it hands over instead.
    pub fn with_simulation<R>(&self, f: impl FnOnce(&mut Simulation) -> R) -> R {
        f(&mut *self.shared.lock())
    }

    /// Current day.
    pub fn day(&self) -> u64 {
        self.read(WorldState::day)
    }

    /// Manual reset: report the current run and start a fresh world.
    pub fn reset(&self, cause: &str) -> Option<PathBuf> {
        self.shared.lock().reset(cause)
    }

    /// Persist system state (the faction Q-tables) now.
    pub fn flush(&self) {
        self.shared.lock().flush();
    }

    /// Wipe one faction's learning. Returns `false` if no culture system is
    /// registered.
    pub fn reset_faction_brain(&self, faction: &FactionId) -> bool {
        let mut simulation = self.shared.lock();
        let Some(culture) = simulation.pipeline_mut().system_mut::<CultureSystem>() else {
            warn!(faction = %faction, "no culture system registered");
            return false;
        };
        culture.reset_brain(faction);
        true
    }

    /// Turn extinction auto-restart on or off.
    pub fn set_auto_restart(&self, enabled: bool) {
        self.shared.lock().set_auto_restart(enabled);
    }
}

fn join_worker(handle: JoinHandle<()>) {
    if handle.thread().id() == thread::current().id() {
        return;
    }
    if handle.join().is_err() {
        warn!("tick thread panicked");
    }
}
