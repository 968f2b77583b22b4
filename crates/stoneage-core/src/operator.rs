//! Operator control state for runtime simulation management.
//!
//! Shared atomic flags read by the background tick loop and written by any
//! controlling thread. None of these operations take the world lock, so
//! pause, resume and speed changes can be issued from inside a locked
//! section (or from the loop itself) without deadlocking.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use crate::config::EngineConfig;

/// Shared operator control state.
#[derive(Debug)]
pub struct OperatorState {
    /// Whether the loop is paused.
    paused: AtomicBool,

    /// Whether the background loop is alive.
    running: AtomicBool,

    /// Whether the background loop should exit.
    stop_requested: AtomicBool,

    /// Current speed multiplier, stored as `f64` bits.
    speed_bits: AtomicU64,

    /// Ticks per second at speed 1.0.
    tick_rate_limit: u32,

    /// Lowest accepted speed.
    min_speed: f64,

    /// Highest accepted speed.
    max_speed: f64,

    /// Poll interval while paused.
    paused_poll: Duration,
}

impl OperatorState {
    /// Create operator state from configuration. The loop starts unpaused
    /// and not running.
    pub fn new(config: &EngineConfig) -> Self {
        let speed = config.speed.max(config.min_speed).min(config.max_speed);
        Self {
            paused: AtomicBool::new(false),
            running: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            speed_bits: AtomicU64::new(speed.to_bits()),
            tick_rate_limit: config.tick_rate_limit.max(1),
            min_speed: config.min_speed,
            max_speed: config.max_speed,
            paused_poll: Duration::from_millis(config.paused_poll_ms.max(1)),
        }
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// Check whether the simulation is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Pause the simulation. The loop keeps polling but does not tick.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume the simulation.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
    }

    /// Flip the pause flag. Returns the new value.
    pub fn toggle_pause(&self) -> bool {
        !self.paused.fetch_xor(true, Ordering::AcqRel)
    }

    // -----------------------------------------------------------------------
    // Loop lifecycle
    // -----------------------------------------------------------------------

    /// Check whether the background loop is alive.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Mark the loop alive or dead. Returns the previous value.
    pub fn set_running(&self, running: bool) -> bool {
        self.running.swap(running, Ordering::AcqRel)
    }

    /// Request the loop to exit after its current iteration.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    /// Clear a previous stop request before starting a new loop.
    pub fn clear_stop(&self) {
        self.stop_requested.store(false, Ordering::Release);
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    // -----------------------------------------------------------------------
    // Speed
    // -----------------------------------------------------------------------

    /// Current speed multiplier.
    pub fn speed(&self) -> f64 {
        f64::from_bits(self.speed_bits.load(Ordering::Acquire))
    }

    /// Set the speed multiplier, clamped to the configured bounds.
    ///
    /// Returns the previous speed on success, or `None` if `speed` is not
    /// a finite positive number.
    pub fn set_speed(&self, speed: f64) -> Option<f64> {
        if !speed.is_finite() || speed <= 0.0 {
            return None;
        }
        let clamped = speed.max(self.min_speed).min(self.max_speed);
        let prev = self.speed_bits.swap(clamped.to_bits(), Ordering::AcqRel);
        Some(f64::from_bits(prev))
    }

    /// Ticks per second at speed 1.0.
    pub const fn tick_rate_limit(&self) -> u32 {
        self.tick_rate_limit
    }

    /// Target wall time per tick: `1 / (tick_rate_limit * speed)`.
    pub fn target_interval(&self) -> Duration {
        let rate = f64::from(self.tick_rate_limit) * self.speed();
        if rate.is_finite() && rate > 0.0 {
            Duration::try_from_secs_f64(1.0 / rate).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        }
    }

    /// Sleep interval of the loop while paused.
    pub const fn paused_poll(&self) -> Duration {
        self.paused_poll
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn state() -> OperatorState {
        OperatorState::new(&EngineConfig::default())
    }

    #[test]
    fn initial_state_is_idle() {
        let op = state();
        assert!(!op.is_paused());
        assert!(!op.is_running());
        assert!(!op.is_stop_requested());
        assert_eq!(op.tick_rate_limit(), 20);
    }

    #[test]
    fn pause_resume_and_toggle() {
        let op = state();
        op.pause();
        assert!(op.is_paused());
        op.resume();
        assert!(!op.is_paused());
        assert!(op.toggle_pause());
        assert!(op.is_paused());
        assert!(!op.toggle_pause());
    }

    #[test]
    fn set_speed_returns_previous() {
        let op = state();
        let prev = op.set_speed(2.0).unwrap();
        assert!((prev - 1.0).abs() < f64::EPSILON);
        assert!((op.speed() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn set_speed_rejects_nonsense_and_clamps() {
        let op = state();
        assert!(op.set_speed(0.0).is_none());
        assert!(op.set_speed(-1.0).is_none());
        assert!(op.set_speed(f64::NAN).is_none());
        assert!(op.set_speed(f64::INFINITY).is_none());
        op.set_speed(1_000.0).unwrap();
        assert!((op.speed() - 50.0).abs() < f64::EPSILON);
        op.set_speed(0.001).unwrap();
        assert!((op.speed() - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn target_interval_follows_speed() {
        let op = state();
        assert!((op.target_interval().as_secs_f64() - 0.05).abs() < 1e-9);
        op.set_speed(2.0).unwrap();
        assert!((op.target_interval().as_secs_f64() - 0.025).abs() < 1e-9);
    }
}
