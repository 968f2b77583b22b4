//! Read-only summaries handed to the reporter at the end of a run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::{DeathCause, MatingNorm, RationingNorm};
use crate::ids::{AgentId, FactionId};

/// Summary of one faction at report time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactionSnapshot {
    /// Faction identifier.
    pub id: FactionId,
    /// Living members.
    pub living: usize,
    /// Food store.
    pub food: f64,
    /// Current chief.
    pub chief_id: Option<AgentId>,
    /// Mating-strictness slider.
    pub mating_strictness: f64,
    /// Rationing-strictness slider.
    pub rationing_strictness: f64,
    /// Derived mating label.
    pub mating_norm: MatingNorm,
    /// Derived rationing label.
    pub rationing_norm: RationingNorm,
    /// Number of states the faction's learner has visited.
    pub known_states: usize,
}

/// End-of-run summary: why the run ended and what it looked like.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSnapshot {
    /// Day the run ended on.
    pub day: u64,
    /// Run number, starting at 1 and incremented on every reset.
    pub run_number: u32,
    /// Reason the report was written ("Extinction", "Manual Reset", ...).
    pub cause: String,
    /// Agents alive at report time.
    pub living: usize,
    /// Agents created during the run.
    pub total_spawned: u64,
    /// Dead agents already moved to cold storage.
    pub archived: u64,
    /// Deaths by cause over the whole run.
    pub deaths_by_cause: BTreeMap<DeathCause, u64>,
    /// Diseases that emerged during the run.
    pub diseases_emerged: usize,
    /// Per-faction summaries in configuration order.
    pub factions: Vec<FactionSnapshot>,
}

impl ReportSnapshot {
    /// Total deaths over the run.
    pub fn total_deaths(&self) -> u64 {
        self.deaths_by_cause.values().copied().fold(0_u64, u64::saturating_add)
    }
}
