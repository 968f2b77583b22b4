//! Simulation kernel of the Stone Age agent-population model.
//!
//! This crate owns the daily tick: the world clock, the shared
//! [`WorldState`], the [`System`] pipeline contract with the four standard
//! systems, and the [`Engine`] that runs the pipeline on a background
//! thread while other threads observe and control it.
//!
//! # Modules
//!
//! - [`chance`] -- Probability rolls that tolerate out-of-range inputs.
//! - [`chronicle`] -- Bounded, queryable event log ([`Chronicle`]).
//! - [`clock`] -- Day counter and season derivation.
//! - [`collaborators`] -- Archiver, reporter and Q-table store interfaces,
//!   with in-memory implementations.
//! - [`config`] -- Configuration loading from `stoneage-config.yaml` into
//!   strongly-typed structs.
//! - [`engine`] -- Background tick loop, pause/resume/speed, crash
//!   containment.
//! - [`operator`] -- Lock-free control flags shared with the loop.
//! - [`pipeline`] -- The [`System`] trait and ordered [`Pipeline`].
//! - [`simulation`] -- One tick: clock, systems, archiving, extinction.
//! - [`state`] -- The [`WorldState`] every system mutates.
//! - [`systems`] -- Leadership, biology, disease and culture.

pub mod chance;
pub mod chronicle;
pub mod clock;
pub mod collaborators;
pub mod config;
pub mod engine;
pub mod operator;
pub mod pipeline;
pub mod simulation;
pub mod state;
pub mod systems;

pub use chronicle::{Chronicle, DEFAULT_CHRONICLE_CAPACITY};
pub use clock::{ClockError, DAYS_PER_YEAR, WorldClock, season_for_day};
pub use collaborators::{Archiver, BrainStore, MemoryArchiver, MemoryBrainStore, MemoryReporter, Reporter};
pub use config::{
    BiologyConfig, ConfigError, CultureConfig, DiseaseConfig, EngineConfig, KernelConfig, StorageConfig,
    WorldConfig,
};
pub use engine::{Engine, EngineError};
pub use operator::OperatorState;
pub use pipeline::{Pipeline, System, SystemError};
pub use simulation::{EXTINCTION_CAUSE, Simulation, TickError, TickSummary, build_default, default_pipeline};
pub use state::{RunFlags, WorldState};
pub use systems::{BiologySystem, CultureSystem, DiseaseSystem, LeadershipSystem};
