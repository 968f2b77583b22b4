//! Chief election.
//!
//! A faction without a living chief elects one from its adult members.
//! Elders over 30 are preferred; within the candidate pool the highest
//! `age x (0.5 + conscientiousness)` wins. The outgoing chief, if still
//! alive, goes back to gathering.

use stoneage_types::{Agent, AgentId, FactionId, LogCategory, Role};
use tracing::info;

use crate::pipeline::{System, SystemError};
use crate::state::WorldState;

/// Age above which members are preferred as chief.
const ELDER_AGE: f64 = 30.0;

/// Election score of a candidate.
pub fn leadership_score(agent: &Agent) -> f64 {
    agent.age * (0.5 + agent.personality.conscientiousness)
}

/// Pick the chief of `faction` among its living members of at least
/// `min_age`.
pub fn elect(state: &WorldState, faction: &FactionId, min_age: f64) -> Option<AgentId> {
    let best = |elders_only: bool| {
        state
            .population
            .faction_members(faction)
            .filter(|a| a.age >= min_age && (!elders_only || a.age > ELDER_AGE))
            .max_by(|a, b| leadership_score(a).total_cmp(&leadership_score(b)))
            .map(|a| a.id)
    };
    best(true).or_else(|| best(false))
}

/// Keeps every faction led.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeadershipSystem {
    min_age: f64,
}

impl LeadershipSystem {
    /// Chiefs must be at least `min_age` years old.
    pub const fn new(min_age: f64) -> Self {
        Self { min_age }
    }
}

impl System for LeadershipSystem {
    fn name(&self) -> &'static str {
        "leadership"
    }

    fn update(&mut self, state: &mut WorldState) -> Result<(), SystemError> {
        let vacant: Vec<(FactionId, Option<AgentId>)> = state
            .factions
            .values()
            .filter(|f| !f.chief_id.is_some_and(|id| state.population.is_alive(&id)))
            .map(|f| (f.id.clone(), f.chief_id))
            .collect();

        for (faction, previous) in vacant {
            let Some(chief) = elect(state, &faction, self.min_age) else {
                if let Some(record) = state.faction_mut(&faction) {
                    record.chief_id = None;
                }
                continue;
            };
            if let Some(old) = previous.and_then(|id| state.population.get_mut(&id))
                && old.is_alive()
                && old.role == Role::Chief
            {
                old.role = Role::Gatherer;
            }
            if let Some(agent) = state.population.get_mut(&chief) {
                agent.role = Role::Chief;
            }
            if let Some(record) = state.faction_mut(&faction) {
                record.chief_id = Some(chief);
            }
            info!(day = state.day(), faction = %faction, chief = %chief, "new chief");
            state.log(
                LogCategory::Leadership,
                format!("{} now leads the {}.", chief.short(), faction.display_name()),
                Some(chief),
            );
        }
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
