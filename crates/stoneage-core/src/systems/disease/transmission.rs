//! Bulk transmission: one aggregate probability per disease per day.
//!
//! Every living agent with an active infection is a carrier. For a disease
//! with `n` carriers each susceptible agent is infected independently with
//! probability `1 - (1 - transmission)^n`, capped. Carriers are counted
//! before any new infection is added, so a case contracted today does not
//! spread until tomorrow.

use std::collections::BTreeMap;

use stoneage_types::{AgentId, DiseaseId, InfectionRecord, LogCategory};
use tracing::{debug, warn};

use super::registry::DiseaseRegistry;
use crate::chance::roll;
use crate::config::DiseaseConfig;
use crate::state::WorldState;

/// Aggregate daily infection probability for `carriers` active carriers,
/// never above `cap`.
pub fn infection_probability(transmission: f64, carriers: usize, cap: f64) -> f64 {
    if carriers == 0 {
        return 0.0;
    }
    let escape = (1.0 - transmission.clamp(0.0, 1.0)).powi(i32::try_from(carriers).unwrap_or(i32::MAX));
    (1.0 - escape).clamp(0.0, cap.clamp(0.0, 1.0))
}

/// Active carriers per disease, counting living hosts only.
pub fn active_carriers(state: &WorldState) -> BTreeMap<DiseaseId, usize> {
    let mut carriers: BTreeMap<DiseaseId, usize> = BTreeMap::new();
    for record in state.infections.iter() {
        if record.active && state.population.is_alive(&record.agent_id) {
            let count = carriers.entry(record.disease_id).or_insert(0);
            *count = count.saturating_add(1);
        }
    }
    carriers
}

/// Run one transmission pass. Returns the number of new infections.
pub fn transmit(config: &DiseaseConfig, registry: &DiseaseRegistry, state: &mut WorldState) -> usize {
    let carriers = active_carriers(state);
    if carriers.is_empty() {
        return 0;
    }
    let living = state.population.living_ids();
    let mut new_cases: Vec<(AgentId, DiseaseId)> = Vec::new();
    let mut per_disease: Vec<(String, usize)> = Vec::new();

    for (disease_id, count) in carriers {
        let Some(disease) = registry.get(&disease_id) else {
            warn!(disease = %disease_id, "infection references unknown disease, skipping");
            continue;
        };
        let p = infection_probability(disease.transmission, count, config.transmission_cap);
        let before = new_cases.len();
        for agent in &living {
            if state.infections.contains(*agent, disease_id) {
                continue;
            }
            let immunity = state.immunities.level(*agent, disease_id);
            if immunity >= 1.0 || (immunity > 0.0 && roll(&mut state.rng, immunity)) {
                continue;
            }
            if roll(&mut state.rng, p) {
                new_cases.push((*agent, disease_id));
            }
        }
        let spread = new_cases.len().saturating_sub(before);
        debug!(day = state.day(), disease = %disease.name, carriers = count, probability = p, spread, "transmission pass");
        if spread > 0 {
            per_disease.push((disease.name.clone(), spread));
        }
    }

    for (agent, disease) in &new_cases {
        if state.infections.insert(InfectionRecord::new(*agent, *disease)) {
            state.immunities.record_exposure(*agent, *disease);
        }
    }
    for (name, spread) in per_disease {
        state.log(LogCategory::Disease, format!("{spread} new cases of {name}."), None);
    }
    new_cases.len()
}
