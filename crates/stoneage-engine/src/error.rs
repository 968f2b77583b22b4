//! Error types for the engine binary.
//!
//! [`AppError`] is the top-level error type that wraps every failure mode
//! during startup and the supervised run.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The tick engine failed to start or a tick failed.
    #[error("engine error: {source}")]
    Engine {
        /// The underlying engine error.
        #[from]
        source: stoneage_core::EngineError,
    },

    /// An environment variable held an unusable value.
    #[error("config error: {0}")]
    Config(String),

    /// The background loop halted after a tick failure.
    #[error("simulation halted on day {day}")]
    Halted {
        /// Day the engine stopped on.
        day: u64,
    },
}
