//! Shared type definitions for the Stone Age simulation kernel.
//!
//! Every crate in the workspace speaks in these types: agents and their
//! relation-table rows, faction state, learning state and run reports.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers and the string faction identifier
//! - [`enums`] -- Enumeration types (demographics, seasons, disease, policy labels)
//! - [`structs`] -- Table rows (agents, infections, immunity, relationships, factions)
//! - [`learning`] -- Discretized states and Q-tables
//! - [`snapshot`] -- End-of-run report summaries

pub mod enums;
pub mod ids;
pub mod learning;
pub mod snapshot;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{
    DeathCause, GeneticBand, ImmunityKind, LogCategory, MatingNorm, PopulationBand, RationingNorm,
    RelationshipKind, ResourceBand, Role, Season, Sex,
};
pub use ids::{AgentId, DiseaseId, FactionId, FamilyId};
pub use learning::{ACTION_COUNT, QTable, StateKey};
pub use snapshot::{FactionSnapshot, ReportSnapshot};
pub use structs::{
    AGENT_SCHEMA_VERSION, Agent, DiseaseDefinition, FactionPolicy, FactionState, ImmunityRecord,
    InfectionRecord, InventoryRecord, LogEntry, Personality, Relationship, SeverityEffects,
    SkillRecord,
};
