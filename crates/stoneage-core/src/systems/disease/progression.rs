//! Daily progression of active infections, recovery and dormancy, immunity
//! decay and reactivation of dormant infections.
//!
//! State machine per (agent, disease):
//!
//! ```text
//! Uninfected -> Active -> Recovered   (non-chronic: record deleted, immunity granted)
//!                      -> Dormant     (chronic: record kept, active = false)
//! Dormant -> Active                   (weak host, reactivation roll)
//! ```
//!
//! Infections of dead hosts are left alone until the archiver removes the
//! host and its relation rows.

use stoneage_types::{AgentId, DeathCause, DiseaseDefinition, DiseaseId, ImmunityKind, ImmunityRecord, LogCategory};
use tracing::{debug, warn};

use super::registry::DiseaseRegistry;
use crate::chance::roll;
use crate::config::DiseaseConfig;
use crate::state::WorldState;

/// Counts produced by one progression pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressionOutcome {
    /// Hosts killed by their infection.
    pub deaths: usize,
    /// Non-chronic infections that cleared.
    pub recovered: usize,
    /// Chronic infections that went dormant.
    pub dormant: usize,
}

/// Damage multiplier for a host: genetic vulnerability always scales the
/// damage, and a sensitizing disease hits harder with every prior exposure.
pub fn damage_multiplier(config: &DiseaseConfig, disease: &DiseaseDefinition, vulnerability: f64, exposures: u32) -> f64 {
    let genetic = 1.0 + vulnerability.clamp(0.0, 1.0);
    let sensitized = if disease.immunity == ImmunityKind::Sensitizing {
        config
            .sensitizing_damage_step
            .mul_add(f64::from(exposures.saturating_sub(1)), 1.0)
    } else {
        1.0
    };
    genetic * sensitized
}

/// Strengthen immunity after an active phase ends.
pub fn grant_immunity(config: &DiseaseConfig, kind: ImmunityKind, record: &mut ImmunityRecord) {
    match kind {
        ImmunityKind::Sterilizing => record.set_level(1.0),
        ImmunityKind::Waning => record.raise(config.recovery_boost),
        ImmunityKind::Sensitizing => record.raise(config.sensitizing_boost),
    }
}

/// Advance every active infection of a living host by one day.
pub fn progress(config: &DiseaseConfig, registry: &DiseaseRegistry, state: &mut WorldState) -> ProgressionOutcome {
    let day = state.day();
    let active: Vec<(AgentId, DiseaseId)> = state
        .infections
        .iter()
        .filter(|r| r.active && state.population.is_alive(&r.agent_id))
        .map(|r| (r.agent_id, r.disease_id))
        .collect();

    let mut outcome = ProgressionOutcome::default();
    let mut entries: Vec<(LogCategory, String, Option<AgentId>)> = Vec::new();

    for (agent_id, disease_id) in active {
        let Some(disease) = registry.get(&disease_id) else {
            warn!(day, agent = %agent_id, disease = %disease_id, "infection references unknown disease, skipping");
            continue;
        };
        let Some(record) = state.infections.get_mut(agent_id, disease_id) else {
            continue;
        };
        record.days_infected = record.days_infected.saturating_add(1);
        record.progress = f64::from(record.days_infected) / f64::from(disease.duration.max(1));
        let finished = record.days_infected >= disease.duration;

        let exposures = state.immunities.get(agent_id, disease_id).map_or(1, |r| r.exposures);
        let Some(host) = state.population.get_mut(&agent_id) else {
            continue;
        };
        let multiplier = damage_multiplier(config, disease, host.genetic_vulnerability, exposures);
        host.change_hp(disease.effects.hp * multiplier);
        host.change_stamina(disease.effects.stamina * multiplier);

        let lethal_roll = host.hp_fraction() < config.lethality_hp_fraction && {
            let p = disease.lethality / f64::from(disease.duration.max(1)) * (0.5 + host.genetic_vulnerability);
            roll(&mut state.rng, p)
        };
        if host.hp <= 0.0 || lethal_roll {
            host.mark_dead(DeathCause::Disease, day);
            outcome.deaths = outcome.deaths.saturating_add(1);
            entries.push((
                LogCategory::Death,
                format!("{} died of {}.", agent_id.short(), disease.name),
                Some(agent_id),
            ));
            continue;
        }

        if !finished {
            continue;
        }
        if disease.chronic {
            if let Some(record) = state.infections.get_mut(agent_id, disease_id) {
                record.active = false;
            }
            outcome.dormant = outcome.dormant.saturating_add(1);
        } else {
            state.infections.remove(agent_id, disease_id);
            outcome.recovered = outcome.recovered.saturating_add(1);
        }
        match state.immunities.get_mut(agent_id, disease_id) {
            Some(immunity) => grant_immunity(config, disease.immunity, immunity),
            None => {
                let immunity = state.immunities.record_exposure(agent_id, disease_id);
                grant_immunity(config, disease.immunity, immunity);
            }
        }
        debug!(day, agent = %agent_id, disease = %disease.name, chronic = disease.chronic, "active phase ended");
    }

    if outcome.recovered > 0 || outcome.dormant > 0 {
        entries.push((
            LogCategory::Disease,
            format!("{} recovered, {} went dormant.", outcome.recovered, outcome.dormant),
            None,
        ));
    }
    for (category, message, agent) in entries {
        state.log(category, message, agent);
    }
    outcome
}

/// Linear daily decay of every immunity that is not sterilizing.
pub fn decay_immunity(config: &DiseaseConfig, registry: &DiseaseRegistry, state: &mut WorldState) {
    for record in state.immunities.iter_mut() {
        let kind = registry.get(&record.disease_id).map(|d| d.immunity);
        if kind != Some(ImmunityKind::Sterilizing) {
            record.decay(config.immunity_decay);
        }
    }
}

/// Reactivate dormant infections in weak hosts. Returns the number
/// reactivated.
pub fn reactivate(config: &DiseaseConfig, registry: &DiseaseRegistry, state: &mut WorldState) -> usize {
    let dormant: Vec<(AgentId, DiseaseId)> = state
        .infections
        .iter()
        .filter(|r| !r.active)
        .filter(|r| {
            state.population.get_living(&r.agent_id).is_some_and(|host| {
                host.hp_fraction() < config.weak_hp_fraction
                    || host.stamina < config.weak_stamina
                    || host.age > config.weak_age
            })
        })
        .map(|r| (r.agent_id, r.disease_id))
        .collect();

    let mut reactivated = 0_usize;
    for (agent_id, disease_id) in dormant {
        if !roll(&mut state.rng, config.reactivation_chance) {
            continue;
        }
        if let Some(record) = state.infections.get_mut(agent_id, disease_id) {
            record.active = true;
            record.days_infected = 0;
            record.progress = 0.0;
            reactivated = reactivated.saturating_add(1);
            let name = registry.get(&disease_id).map_or("an old disease", |d| d.name.as_str());
            let message = format!("{}'s {name} flared up again.", agent_id.short());
            state.log(LogCategory::Disease, message, Some(agent_id));
        }
    }
    reactivated
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use stoneage_types::{Agent, FactionId, InfectionRecord, SeverityEffects, Sex};

    use super::*;
    use crate::config::KernelConfig;
    use crate::state::RunFlags;

    fn world_with_host(seed: u64) -> (WorldState, AgentId) {
        let mut config = KernelConfig::default();
        config.world.initial_population = 0;
        let mut state = WorldState::with_seed(&config, RunFlags::first(false), seed);
        let host = state
            .population
            .insert(Agent::new(FactionId::from("blue_tribe"), Sex::Male, 30.0, 0))
            .unwrap();
        (state, host)
    }

    fn register(registry: &mut DiseaseRegistry, chronic: bool, immunity: ImmunityKind) -> DiseaseId {
        registry.register(DiseaseDefinition {
            id: DiseaseId::new(),
            name: "Grey Lung".to_owned(),
            transmission: 0.1,
            lethality: 0.0,
            duration: 4,
            effects: SeverityEffects { hp: 0.0, stamina: 0.0 },
            chronic,
            immunity,
            emerged_on_day: 0,
        })
    }

    fn dormant(state: &mut WorldState, host: AgentId, disease: DiseaseId) {
        let mut record = InfectionRecord::new(host, disease);
        record.active = false;
        record.days_infected = 4;
        record.progress = 1.0;
        state.infections.insert(record);
    }

    #[test]
    fn waning_immunity_decays_linearly_to_zero() {
        let (mut state, host) = world_with_host(21);
        let mut config = DiseaseConfig::default();
        config.immunity_decay = 0.25;
        let mut registry = DiseaseRegistry::new();
        let id = register(&mut registry, false, ImmunityKind::Waning);
        state.immunities.record_exposure(host, id).set_level(0.6);

        decay_immunity(&config, &registry, &mut state);
        assert!((state.immunities.level(host, id) - 0.35).abs() < 1e-12);
        decay_immunity(&config, &registry, &mut state);
        assert!((state.immunities.level(host, id) - 0.1).abs() < 1e-12);
        decay_immunity(&config, &registry, &mut state);
        assert!(state.immunities.level(host, id).abs() < f64::EPSILON);
        decay_immunity(&config, &registry, &mut state);
        assert!(state.immunities.level(host, id).abs() < f64::EPSILON);
    }

    #[test]
    fn sterilizing_immunity_never_decays() {
        let (mut state, host) = world_with_host(22);
        let mut config = DiseaseConfig::default();
        config.immunity_decay = 0.5;
        let mut registry = DiseaseRegistry::new();
        let sterilizing = register(&mut registry, false, ImmunityKind::Sterilizing);
        let sensitizing = register(&mut registry, false, ImmunityKind::Sensitizing);
        state.immunities.record_exposure(host, sterilizing).set_level(1.0);
        state.immunities.record_exposure(host, sensitizing).set_level(1.0);

        for _ in 0..10 {
            decay_immunity(&config, &registry, &mut state);
        }
        assert!(state.immunities.get(host, sterilizing).unwrap().is_full());
        assert!(state.immunities.level(host, sensitizing).abs() < f64::EPSILON);
    }

    #[test]
    fn weak_host_reactivates_dormant_infection() {
        let (mut state, host) = world_with_host(23);
        let mut config = DiseaseConfig::default();
        config.reactivation_chance = 1.0;
        let mut registry = DiseaseRegistry::new();
        let id = register(&mut registry, true, ImmunityKind::Waning);
        dormant(&mut state, host, id);
        state.population.get_mut(&host).unwrap().hp = 10.0;

        assert_eq!(reactivate(&config, &registry, &mut state), 1);
        let record = state.infections.get(host, id).unwrap();
        assert!(record.active);
        assert_eq!(record.days_infected, 0);
        assert!(record.progress.abs() < f64::EPSILON);
        assert_eq!(state.chronicle.by_category(LogCategory::Disease).len(), 1);
    }

    #[test]
    fn healthy_host_stays_dormant() {
        let (mut state, host) = world_with_host(24);
        let mut config = DiseaseConfig::default();
        config.reactivation_chance = 1.0;
        let mut registry = DiseaseRegistry::new();
        let id = register(&mut registry, true, ImmunityKind::Waning);
        dormant(&mut state, host, id);

        assert_eq!(reactivate(&config, &registry, &mut state), 0);
        let record = state.infections.get(host, id).unwrap();
        assert!(!record.active);
        assert_eq!(record.days_infected, 4);
    }
}
