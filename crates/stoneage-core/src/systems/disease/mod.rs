//! The contagion subsystem.
//!
//! # Modules
//!
//! - [`registry`] -- owned store of generated disease definitions
//! - [`transmission`] -- aggregate per-disease spread
//! - [`progression`] -- active phase, recovery, dormancy and reactivation
//!
//! Order inside one update: outbreak, transmission, progression, immunity
//! decay, reactivation.

pub mod progression;
pub mod registry;
pub mod transmission;

use rand::seq::IndexedRandom;
use stoneage_types::{DiseaseId, InfectionRecord, LogCategory, ReportSnapshot};
use tracing::{info, warn};

use self::registry::{DiseaseRegistry, generate_disease};
use crate::chance::roll;
use crate::config::DiseaseConfig;
use crate::pipeline::{System, SystemError};
use crate::state::WorldState;

/// Daily outbreak probability for a living population, capped.
pub fn outbreak_chance(config: &DiseaseConfig, living: usize) -> f64 {
    if living < config.min_outbreak_population {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let living = living as f64;
    config
        .outbreak_chance_per_agent
        .mul_add(living, config.outbreak_base_chance)
        .min(config.max_outbreak_chance)
}

/// Runs the contagion state machine once per tick.
#[derive(Debug, Default)]
pub struct DiseaseSystem {
    config: DiseaseConfig,
    registry: DiseaseRegistry,
}

impl DiseaseSystem {
    /// A disease system with an empty registry.
    pub const fn new(config: DiseaseConfig) -> Self {
        Self {
            config,
            registry: DiseaseRegistry::new(),
        }
    }

    /// Every disease that emerged in the current run.
    pub const fn registry(&self) -> &DiseaseRegistry {
        &self.registry
    }

    /// Mutable registry access, used to seed known diseases.
    pub const fn registry_mut(&mut self) -> &mut DiseaseRegistry {
        &mut self.registry
    }

    /// Generate a new disease and infect one random living agent.
    ///
    /// Patient zero is chosen before the disease is generated, so an empty
    /// world produces no definition. Returns `None` in that case.
    pub fn outbreak(&mut self, state: &mut WorldState) -> Option<DiseaseId> {
        let living = state.population.living_ids();
        let Some(patient_zero) = living.choose(&mut state.rng).copied() else {
            warn!(day = state.day(), "outbreak with no living agents, skipping");
            return None;
        };
        let disease = generate_disease(&mut state.rng, state.clock.day());
        let name = disease.name.clone();
        let id = self.registry.register(disease);
        state.infections.insert(InfectionRecord::new(patient_zero, id));
        state.immunities.record_exposure(patient_zero, id);
        info!(day = state.day(), disease = %name, agent_id = %patient_zero, "outbreak");
        state.log(
            LogCategory::Outbreak,
            format!("OUTBREAK: {name} detected in {}.", patient_zero.short()),
            Some(patient_zero),
        );
        Some(id)
    }
}

impl System for DiseaseSystem {
    fn name(&self) -> &'static str {
        "disease"
    }

    fn update(&mut self, state: &mut WorldState) -> Result<(), SystemError> {
        let chance = outbreak_chance(&self.config, state.living_count());
        if chance > 0.0 && roll(&mut state.rng, chance) {
            self.outbreak(state);
        }
        transmission::transmit(&self.config, &self.registry, state);
        progression::progress(&self.config, &self.registry, state);
        progression::decay_immunity(&self.config, &self.registry, state);
        progression::reactivate(&self.config, &self.registry, state);
        Ok(())
    }

    fn on_world_reset(&mut self, _ending: &WorldState) {
        self.registry.clear();
    }

    fn contribute_to_report(&self, report: &mut ReportSnapshot) {
        report.diseases_emerged = self.registry.len();
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
