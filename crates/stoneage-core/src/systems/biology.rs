//! Daily life: foraging, rationing, vitals, healing, pairing, conception
//! and birth.
//!
//! Biology reads the faction policy labels but never changes the sliders.
//! Deaths are flagged on the row; rows leave the table only through the
//! archiver.

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use stoneage_agents::{FORAGING, HEALING, STONE_TOOL, apply_daily_vitals, child_of, role_for_age};
use stoneage_types::{AgentId, DeathCause, FactionId, LogCategory, MatingNorm, RationingNorm, Role, Season, Sex};
use tracing::{debug, warn};

use crate::chance::roll;
use crate::config::BiologyConfig;
use crate::pipeline::{System, SystemError};
use crate::state::WorldState;

/// Counts from one biology pass, mostly for tests and debug logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BiologyOutcome {
    /// Agents who ate today.
    pub fed: usize,
    /// Agents who died today.
    pub deaths: usize,
    /// New spouse pairs.
    pub pairs: usize,
    /// New pregnancies.
    pub conceptions: usize,
    /// Children born.
    pub births: usize,
}

/// Runs the daily life cycle of every living agent.
#[derive(Debug, Default)]
pub struct BiologySystem {
    config: BiologyConfig,
}

impl BiologySystem {
    /// A biology system with the given parameters.
    pub const fn new(config: BiologyConfig) -> Self {
        Self { config }
    }

    /// Yield multiplier for a season.
    pub const fn season_multiplier(&self, season: Season) -> f64 {
        let [spring, summer, autumn, winter] = self.config.season_multipliers;
        match season {
            Season::Spring => spring,
            Season::Summer => summer,
            Season::Autumn => autumn,
            Season::Winter => winter,
        }
    }

    /// Run every step of the day and report what happened.
    pub fn live_one_day(&self, state: &mut WorldState) -> BiologyOutcome {
        let mut outcome = BiologyOutcome::default();
        self.forage(state);
        let fed = self.ration(state);
        outcome.fed = fed.len();
        outcome.deaths = self.apply_vitals(state, &fed);
        self.tend_the_sick(state);
        self.mature(state);
        outcome.pairs = self.pair(state);
        outcome.conceptions = self.conceive(state);
        let (births, childbirth_deaths) = self.deliver(state);
        outcome.births = births;
        outcome.deaths = outcome.deaths.saturating_add(childbirth_deaths);
        debug!(
            day = state.day(),
            fed = outcome.fed,
            deaths = outcome.deaths,
            births = outcome.births,
            "biology pass"
        );
        outcome
    }

    // -----------------------------------------------------------------------
    // Food
    // -----------------------------------------------------------------------

    /// Gatherers and hunters bring food into their faction's store.
    fn forage(&self, state: &mut WorldState) {
        let multiplier = self.season_multiplier(state.season());
        let workers: Vec<(AgentId, FactionId, f64, f64)> = state
            .population
            .living()
            .filter_map(|a| {
                let base = match a.role {
                    Role::Gatherer => self.config.forage_yield,
                    Role::Hunter => self.config.hunt_yield,
                    Role::Child | Role::Healer | Role::Chief => return None,
                };
                Some((a.id, a.faction_id.clone(), base, a.personality.conscientiousness))
            })
            .collect();

        let mut gathered: BTreeMap<FactionId, f64> = BTreeMap::new();
        for (id, faction, base, conscientiousness) in workers {
            let skill = state.skills.level(id, FORAGING);
            let has_tool = state.inventory.has(id, STONE_TOOL);
            let tool = if has_tool { 1.0 + self.config.tool_bonus } else { 1.0 };
            let amount = base * multiplier * (0.5 + conscientiousness) * (1.0 + skill) * tool;
            *gathered.entry(faction).or_insert(0.0) += amount;
            state.skills.practice(id, FORAGING, self.config.skill_practice_rate);
            if has_tool
                && roll(&mut state.rng, self.config.tool_wear_chance)
                && let Err(err) = state.inventory.take(id, STONE_TOOL, 1)
            {
                warn!(agent_id = %id, error = %err, "tool wear on missing tool");
            }
        }
        for (faction, amount) in gathered {
            if let Some(record) = state.faction_mut(&faction) {
                record.food += amount;
            }
        }
    }

    /// Hand out one ration per member while the store lasts, in the order
    /// the faction's rationing norm dictates. Returns who ate.
    fn ration(&self, state: &mut WorldState) -> BTreeSet<AgentId> {
        let mut fed = BTreeSet::new();
        let factions: Vec<(FactionId, RationingNorm)> = state
            .factions
            .values()
            .map(|f| (f.id.clone(), f.policy.rationing_norm()))
            .collect();
        for (faction, norm) in factions {
            let mut members: Vec<(AgentId, bool, f64)> = state
                .population
                .faction_members(&faction)
                .map(|a| (a.id, a.role == Role::Child, a.hp))
                .collect();
            match norm {
                RationingNorm::Communal => members.shuffle(&mut state.rng),
                RationingNorm::Balanced => {
                    members.shuffle(&mut state.rng);
                    members.sort_by_key(|(_, child, _)| !*child);
                }
                RationingNorm::Meritocratic => members.sort_by(|a, b| b.2.total_cmp(&a.2)),
            }
            let Some(record) = state.faction_mut(&faction) else {
                continue;
            };
            for (id, _, _) in members {
                if record.food < self.config.ration_per_agent {
                    break;
                }
                record.food -= self.config.ration_per_agent;
                fed.insert(id);
            }
        }
        fed
    }

    // -----------------------------------------------------------------------
    // Health
    // -----------------------------------------------------------------------

    /// Age, burn, eat and check death for every living agent. Returns the
    /// number of deaths.
    fn apply_vitals(&self, state: &mut WorldState, fed: &BTreeSet<AgentId>) -> usize {
        let day = state.day();
        let winter = state.season() == Season::Winter;
        let mut deaths: Vec<(AgentId, DeathCause)> = Vec::new();
        for agent in state.population.living_mut() {
            let old_age_roll: f64 = state.rng.random();
            let result = apply_daily_vitals(
                agent,
                &self.config.vitals,
                winter,
                fed.contains(&agent.id),
                old_age_roll,
                day,
            );
            if let Some(cause) = result.death {
                deaths.push((agent.id, cause));
            }
        }
        let count = deaths.len();
        for (id, cause) in deaths {
            state.log(LogCategory::Death, format!("{} died of {cause}.", id.short()), Some(id));
        }
        count
    }

    /// Each healer tends the weakest living member of their faction.
    fn tend_the_sick(&self, state: &mut WorldState) {
        let healers: Vec<(AgentId, FactionId)> = state
            .population
            .living()
            .filter(|a| a.role == Role::Healer)
            .map(|a| (a.id, a.faction_id.clone()))
            .collect();
        for (healer, faction) in healers {
            let patient = state
                .population
                .faction_members(&faction)
                .filter(|a| a.hp < a.max_hp)
                .min_by(|a, b| a.hp_fraction().total_cmp(&b.hp_fraction()))
                .map(|a| a.id);
            let Some(patient) = patient else {
                continue;
            };
            let skill = state.skills.level(healer, HEALING);
            if let Some(agent) = state.population.get_mut(&patient) {
                agent.change_hp(self.config.healer_heal * (1.0 + skill));
            }
            state.skills.practice(healer, HEALING, self.config.skill_practice_rate);
        }
    }

    /// Children who came of age take up a working role.
    fn mature(&self, state: &mut WorldState) {
        let adult_age = self.config.spawn.adult_age;
        for agent in state.population.living_mut() {
            if agent.role == Role::Child && agent.age >= adult_age {
                agent.role = role_for_age(&mut state.rng, agent.age, &self.config.spawn);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Reproduction
    // -----------------------------------------------------------------------

    const fn is_fertile(&self, age: f64) -> bool {
        age >= self.config.fertility_min_age && age <= self.config.fertility_max_age
    }

    /// Single fertile females look for a single fertile male in their own
    /// faction, subject to the faction's mating norm. Returns new pairs.
    fn pair(&self, state: &mut WorldState) -> usize {
        let day = state.day();
        let mut pairs = 0_usize;
        let factions: Vec<(FactionId, MatingNorm, f64)> = state
            .factions
            .values()
            .map(|f| (f.id.clone(), f.policy.mating_norm(), f.policy.mating_strictness()))
            .collect();
        for (faction, norm, strictness) in factions {
            let singles = |sex: Sex| -> Vec<AgentId> {
                state
                    .population
                    .faction_members(&faction)
                    .filter(|a| a.sex == sex && self.is_fertile(a.age))
                    .filter(|a| state.relationships.spouse_of(a.id).is_none())
                    .map(|a| a.id)
                    .collect()
            };
            let females = singles(Sex::Female);
            let mut males = singles(Sex::Male);
            let threshold = 1.0 - strictness;

            for female in females {
                if !roll(&mut state.rng, self.config.pairing_chance) {
                    continue;
                }
                let candidates: Vec<AgentId> = males
                    .iter()
                    .copied()
                    .filter(|m| {
                        state
                            .population
                            .get_living(m)
                            .is_some_and(|a| a.genetic_vulnerability <= threshold)
                    })
                    .filter(|m| norm == MatingNorm::FreeUnion || !state.relationships.are_close_kin(female, *m))
                    .collect();
                let Some(male) = candidates.choose(&mut state.rng).copied() else {
                    continue;
                };
                if state.relationships.bond(female, male, day) {
                    males.retain(|m| *m != male);
                    pairs = pairs.saturating_add(1);
                    debug!(day, faction = %faction, female = %female, male = %male, "pair bonded");
                }
            }
        }
        pairs
    }

    /// Bonded fertile females with a living spouse may conceive while the
    /// world has room. Returns new pregnancies.
    fn conceive(&self, state: &mut WorldState) -> usize {
        let mut headroom = self
            .config
            .max_population
            .saturating_sub(state.living_count())
            .saturating_sub(state.population.living().filter(|a| a.pregnant).count());
        if headroom == 0 {
            return 0;
        }
        let candidates: Vec<(AgentId, AgentId)> = state
            .population
            .living()
            .filter(|a| a.sex == Sex::Female && !a.pregnant && self.is_fertile(a.age))
            .filter_map(|a| state.relationships.spouse_of(a.id).map(|s| (a.id, s)))
            .filter(|(_, spouse)| state.population.is_alive(spouse))
            .collect();

        let mut conceptions = 0_usize;
        for (mother, father) in candidates {
            if headroom == 0 {
                break;
            }
            if !roll(&mut state.rng, self.config.conception_chance) {
                continue;
            }
            if let Some(agent) = state.population.get_mut(&mother) {
                agent.pregnant = true;
                agent.gestation_days = 0;
                agent.conceived_with = Some(father);
                conceptions = conceptions.saturating_add(1);
                headroom = headroom.saturating_sub(1);
            }
        }
        conceptions
    }

    /// Advance every pregnancy and deliver those at term. Returns
    /// `(births, childbirth deaths)`.
    fn deliver(&self, state: &mut WorldState) -> (usize, usize) {
        let day = state.day();
        let mut due: Vec<AgentId> = Vec::new();
        for agent in state.population.living_mut() {
            if agent.pregnant {
                agent.gestation_days = agent.gestation_days.saturating_add(1);
                if agent.gestation_days >= self.config.gestation_days {
                    due.push(agent.id);
                }
            }
        }

        let mut births = 0_usize;
        let mut deaths = 0_usize;
        for mother_id in due {
            let Some(mother) = state.population.get(&mother_id) else {
                continue;
            };
            let father_id = mother.conceived_with;
            let father = father_id.and_then(|id| state.population.get(&id));
            if father_id.is_some() && father.is_none() {
                warn!(day, mother = %mother_id, "father no longer on record, child inherits from mother only");
            }
            let child = child_of(
                &mut state.rng,
                mother,
                father,
                day,
                &self.config.vitals,
                &self.config.spawn,
            );
            let resolved_father = father.map(|f| f.id);

            if let Some(mother) = state.population.get_mut(&mother_id) {
                mother.pregnant = false;
                mother.gestation_days = 0;
                mother.conceived_with = None;
            }
            let child_id = match state.population.insert(child) {
                Ok(id) => id,
                Err(err) => {
                    warn!(day, mother = %mother_id, error = %err, "newborn rejected");
                    continue;
                }
            };
            state.relationships.add_parent(mother_id, child_id, day);
            if let Some(father) = resolved_father {
                state.relationships.add_parent(father, child_id, day);
            }
            births = births.saturating_add(1);
            state.log(
                LogCategory::Birth,
                format!("{} gave birth to {}.", mother_id.short(), child_id.short()),
                Some(child_id),
            );

            if roll(&mut state.rng, self.config.childbirth_mortality)
                && let Some(mother) = state.population.get_mut(&mother_id)
                && mother.mark_dead(DeathCause::Childbirth, day)
            {
                deaths = deaths.saturating_add(1);
                state.log(
                    LogCategory::Death,
                    format!("{} died in childbirth.", mother_id.short()),
                    Some(mother_id),
                );
            }
        }
        (births, deaths)
    }
}

impl System for BiologySystem {
    fn name(&self) -> &'static str {
        "biology"
    }

    fn update(&mut self, state: &mut WorldState) -> Result<(), SystemError> {
        self.live_one_day(state);
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
