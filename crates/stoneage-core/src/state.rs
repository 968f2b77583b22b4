//! The shared world state every system reads and mutates.
//!
//! [`WorldState`] singly owns the population table, every relation table,
//! the faction records, the chronicle and the random source. Systems receive
//! it by `&mut` for the duration of their `update` call and keep no
//! references into it afterwards.

use std::collections::{BTreeMap, BTreeSet};

use rand::SeedableRng;
use rand::rngs::StdRng;
use stoneage_agents::{
    ImmunityTable, InfectionTable, InventoryTable, PopulationTable, RelationshipTable, STONE_TOOL, SkillTable,
    founder,
};
use stoneage_types::{AgentId, FactionId, FactionState, LogCategory, Role, Season};
use tracing::{debug, warn};

use crate::chance::roll;
use crate::chronicle::Chronicle;
use crate::clock::WorldClock;
use crate::config::KernelConfig;

/// Settings that survive a world reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunFlags {
    /// Whether extinction replaces the world automatically.
    pub auto_restart: bool,
    /// Run counter, starting at 1.
    pub run_number: u32,
}

impl RunFlags {
    /// Flags of the first run.
    pub const fn first(auto_restart: bool) -> Self {
        Self {
            auto_restart,
            run_number: 1,
        }
    }

    /// Flags of the run that replaces this one.
    pub const fn next_run(self) -> Self {
        Self {
            auto_restart: self.auto_restart,
            run_number: self.run_number.saturating_add(1),
        }
    }
}

/// Complete mutable state of one simulated world.
#[derive(Debug)]
pub struct WorldState {
    /// Day counter and season.
    pub clock: WorldClock,
    /// Agent rows.
    pub population: PopulationTable,
    /// Active and dormant infections.
    pub infections: InfectionTable,
    /// Immunity per (agent, disease).
    pub immunities: ImmunityTable,
    /// Kinship and romance graph.
    pub relationships: RelationshipTable,
    /// Skill proficiency.
    pub skills: SkillTable,
    /// Item holdings.
    pub inventory: InventoryTable,
    /// Faction records keyed by id.
    pub factions: BTreeMap<FactionId, FactionState>,
    /// Bounded event log.
    pub chronicle: Chronicle,
    /// Settings carried across resets.
    pub flags: RunFlags,
    /// Random source for every stochastic decision in the run.
    pub rng: StdRng,
}

impl WorldState {
    /// A world with the configured factions and no agents.
    pub fn empty(config: &KernelConfig, flags: RunFlags, rng: StdRng) -> Self {
        let factions = config
            .world
            .factions
            .iter()
            .map(|name| {
                let id = FactionId::new(name.as_str());
                (id.clone(), FactionState::new(id, 0.0))
            })
            .collect();
        Self {
            clock: WorldClock::new(),
            population: PopulationTable::new(),
            infections: InfectionTable::new(),
            immunities: ImmunityTable::new(),
            relationships: RelationshipTable::new(),
            skills: SkillTable::new(),
            inventory: InventoryTable::new(),
            factions,
            chronicle: Chronicle::new(config.world.chronicle_capacity),
            flags,
            rng,
        }
    }

    /// A freshly populated world.
    ///
    /// With a configured seed the run is seeded from `seed + run_number`, so
    /// each restart differs but stays reproducible; otherwise from entropy.
    pub fn fresh(config: &KernelConfig, flags: RunFlags) -> Self {
        let rng = match config.world.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(u64::from(flags.run_number))),
            None => StdRng::from_os_rng(),
        };
        let mut state = Self::empty(config, flags, rng);
        state.populate(config);
        state
    }

    /// A freshly populated world with an explicit seed.
    pub fn with_seed(config: &KernelConfig, flags: RunFlags, seed: u64) -> Self {
        let mut state = Self::empty(config, flags, StdRng::seed_from_u64(seed));
        state.populate(config);
        state
    }

    fn populate(&mut self, config: &KernelConfig) {
        let faction_ids: Vec<FactionId> = self.factions.keys().cloned().collect();
        if faction_ids.is_empty() {
            warn!("no factions configured, world starts empty");
            return;
        }
        let day = self.clock.day();
        for n in 0..config.world.initial_population {
            let slot = usize::try_from(n).unwrap_or(0).checked_rem(faction_ids.len()).unwrap_or(0);
            let Some(faction) = faction_ids.get(slot) else {
                continue;
            };
            let agent = founder(&mut self.rng, faction.clone(), day, &config.biology.vitals, &config.biology.spawn);
            let adult = agent.role != Role::Child;
            match self.population.insert(agent) {
                Ok(id) => {
                    if adult && roll(&mut self.rng, config.biology.spawn.starting_tool_chance) {
                        self.inventory.add(id, STONE_TOOL, 1);
                    }
                }
                Err(err) => warn!(error = %err, "founder rejected"),
            }
        }
        for faction in self.factions.values_mut() {
            let members = self.population.faction_members(&faction.id).count();
            faction.food = config.world.starting_food_per_agent * f64::from(u32::try_from(members).unwrap_or(u32::MAX));
        }
        let living = self.population.living_count();
        let run = self.flags.run_number;
        self.log(
            LogCategory::Engine,
            format!("World created with {living} agents (run {run})."),
            None,
        );
    }

    /// Current day.
    pub const fn day(&self) -> u64 {
        self.clock.day()
    }

    /// Current season.
    pub const fn season(&self) -> Season {
        self.clock.season()
    }

    /// Number of living agents.
    pub fn living_count(&self) -> usize {
        self.population.living_count()
    }

    /// Faction record by id.
    pub fn faction(&self, id: &FactionId) -> Option<&FactionState> {
        self.factions.get(id)
    }

    /// Faction record by id, for mutation.
    pub fn faction_mut(&mut self, id: &FactionId) -> Option<&mut FactionState> {
        self.factions.get_mut(id)
    }

    /// Write a chronicle entry stamped with the current day.
    pub fn log(&mut self, category: LogCategory, message: impl Into<String>, agent_id: Option<AgentId>) {
        let day = self.clock.day();
        self.chronicle.record(day, category, message, agent_id);
    }

    /// Drop every relation-table row of agents that left the population
    /// table, and clear chief slots pointing at them.
    pub fn purge_agents(&mut self, removed: &BTreeSet<AgentId>) {
        if removed.is_empty() {
            return;
        }
        self.infections.purge(removed);
        self.immunities.purge(removed);
        self.relationships.purge(removed);
        self.skills.purge(removed);
        self.inventory.purge(removed);
        for faction in self.factions.values_mut() {
            if faction.chief_id.is_some_and(|chief| removed.contains(&chief)) {
                faction.chief_id = None;
            }
        }
        debug!(day = self.clock.day(), removed = removed.len(), "purged relation rows of archived agents");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(population: u32) -> KernelConfig {
        let mut config = KernelConfig::default();
        config.world.initial_population = population;
        config
    }

    #[test]
    fn fresh_world_spreads_founders_over_factions() {
        let state = WorldState::with_seed(&config(30), RunFlags::first(true), 1);
        assert_eq!(state.living_count(), 30);
        for faction in state.factions.values() {
            assert_eq!(state.population.faction_members(&faction.id).count(), 10);
            assert!((faction.food - 300.0).abs() < f64::EPSILON);
        }
        assert_eq!(state.day(), 0);
        assert_eq!(state.chronicle.len(), 1);
    }

    #[test]
    fn empty_world_has_factions_but_no_agents() {
        let state = WorldState::empty(&config(30), RunFlags::first(false), StdRng::seed_from_u64(0));
        assert_eq!(state.factions.len(), 3);
        assert!(state.population.is_empty());
    }

    #[test]
    fn next_run_preserves_auto_restart() {
        let flags = RunFlags::first(false).next_run();
        assert_eq!(flags.run_number, 2);
        assert!(!flags.auto_restart);
    }
}
