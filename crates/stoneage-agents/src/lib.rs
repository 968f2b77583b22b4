//! Population and relation tables for the Stone Age simulation kernel.
//!
//! This crate contains the table layer: everything that stores or creates
//! agent rows without knowing about ticks, seasons or systems. It sits
//! between `stoneage-types` (the row definitions) and `stoneage-core` (the
//! systems that mutate the tables every day).
//!
//! # Modules
//!
//! - [`config`] -- Tunables for vitals and spawning ([`VitalsConfig`], [`SpawnConfig`])
//! - [`error`] -- Error types for table operations ([`AgentError`])
//! - [`immunities`] -- Immunity records per (agent, disease)
//! - [`infections`] -- Infection records per (agent, disease)
//! - [`inventory`] -- Item holdings per agent
//! - [`population`] -- The population arena ([`PopulationTable`])
//! - [`relationships`] -- Kinship and romance graph
//! - [`skills`] -- Skill proficiency per agent
//! - [`spawn`] -- Founders and newborns
//! - [`vitals`] -- Daily vital mechanics (aging, metabolism, starvation, old age)

pub mod config;
pub mod error;
pub mod immunities;
pub mod infections;
pub mod inventory;
pub mod population;
pub mod relationships;
pub mod skills;
pub mod spawn;
pub mod vitals;

// Re-export primary types at crate root for convenience.
pub use config::{SpawnConfig, VitalsConfig};
pub use error::AgentError;
pub use immunities::ImmunityTable;
pub use infections::InfectionTable;
pub use inventory::{InventoryTable, STONE_TOOL};
pub use population::PopulationTable;
pub use relationships::RelationshipTable;
pub use skills::{FORAGING, HEALING, SkillTable};
pub use spawn::{blend_personality, child_of, founder, role_for_age};
pub use vitals::{VitalTickResult, apply_daily_vitals, daily_burn};
