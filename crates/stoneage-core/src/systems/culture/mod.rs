//! Decentralized per-faction policy learning.
//!
//! # Modules
//!
//! - [`observe`] -- faction statistics, discretization and reward
//! - [`brain`] -- one independent Q-learner per faction
//! - [`policy`] -- decoding actions into slider adjustments
//!
//! Every `cadence_days` each faction observes itself, learns from the
//! interval that just ended, then picks its next action. The reward for an
//! action is therefore measured a full decision interval after it was
//! taken. Brains share nothing with each other.

pub mod brain;
pub mod observe;
pub mod policy;

use std::collections::BTreeMap;

use stoneage_types::{FactionId, LogCategory, QTable, ReportSnapshot};
use tracing::{debug, info, warn};

use self::brain::FactionBrain;
use crate::collaborators::BrainStore;
use crate::config::CultureConfig;
use crate::pipeline::{System, SystemError};
use crate::state::WorldState;

/// Runs every faction's learner and persists their tables.
pub struct CultureSystem {
    config: CultureConfig,
    brains: BTreeMap<FactionId, FactionBrain>,
    store: Box<dyn BrainStore>,
}

impl core::fmt::Debug for CultureSystem {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CultureSystem")
            .field("config", &self.config)
            .field("brains", &self.brains)
            .finish_non_exhaustive()
    }
}

impl CultureSystem {
    /// Create the system, resuming from whatever `store` holds.
    pub fn new(config: CultureConfig, mut store: Box<dyn BrainStore>) -> Self {
        let brains: BTreeMap<FactionId, FactionBrain> = store
            .load()
            .into_iter()
            .map(|(faction, table)| (faction, FactionBrain::from_table(table)))
            .collect();
        if brains.is_empty() {
            info!("no faction brains loaded, starting fresh");
        } else {
            info!(factions = brains.len(), "faction brains loaded");
        }
        Self { config, brains, store }
    }

    /// The learner of `faction`, if it has one yet.
    pub fn brain(&self, faction: &FactionId) -> Option<&FactionBrain> {
        self.brains.get(faction)
    }

    /// Number of states `faction` has visited.
    pub fn known_states(&self, faction: &FactionId) -> usize {
        self.brains.get(faction).map_or(0, FactionBrain::known_states)
    }

    /// Wipe one faction's learning. Other factions are untouched.
    pub fn reset_brain(&mut self, faction: &FactionId) {
        if let Some(brain) = self.brains.get_mut(faction) {
            brain.reset();
            info!(faction = %faction, "faction brain reset");
        }
    }

    /// Persist every table. Returns whether the store accepted them.
    pub fn save(&mut self) -> bool {
        let tables: BTreeMap<FactionId, QTable> = self
            .brains
            .iter()
            .map(|(faction, brain)| (faction.clone(), brain.table().clone()))
            .collect();
        let saved = self.store.save(&tables);
        if saved {
            debug!(factions = tables.len(), "faction brains saved");
        } else {
            warn!("faction brains could not be saved, keeping them in memory");
        }
        saved
    }

    /// One observe, learn, act cycle for every faction.
    fn decide(&mut self, state: &mut WorldState) {
        let factions: Vec<FactionId> = state.factions.keys().cloned().collect();
        for faction in factions {
            let stats = observe::gather(state, &faction);
            let brain = self.brains.entry(faction.clone()).or_default();

            if stats.is_extinct() {
                if terminal_update(&self.config, brain) {
                    info!(day = state.day(), faction = %faction, "faction died out");
                    state.log(
                        LogCategory::Extinction,
                        format!("The {} has died out.", faction.display_name()),
                        None,
                    );
                }
                continue;
            }

            let key = observe::discretize(&self.config, &stats);
            let reward = observe::reward(&self.config, &stats);
            brain.learn(reward, Some(&key), self.config.alpha, self.config.gamma);
            let action = brain.act(&mut state.rng, key, self.config.epsilon);
            debug!(day = state.day(), faction = %faction, state = %key, reward, action, "culture decision");

            let Some(record) = state.factions.get_mut(&faction) else {
                continue;
            };
            if policy::apply(&mut record.policy, action, self.config.slider_step) {
                let message = format!(
                    "The {} now follows {} mating and {} rationing.",
                    faction.display_name(),
                    record.policy.mating_norm(),
                    record.policy.rationing_norm(),
                );
                state.log(LogCategory::Policy, message, None);
            }
        }
    }
}

/// Close out an extinct faction's pending action with the extinction reward.
/// Returns whether there was one.
fn terminal_update(config: &CultureConfig, brain: &mut FactionBrain) -> bool {
    if brain.pending().is_none() {
        return false;
    }
    brain.learn(config.extinction_reward, None, config.alpha, config.gamma);
    brain.forget_pending();
    true
}

impl System for CultureSystem {
    fn name(&self) -> &'static str {
        "culture"
    }

    fn update(&mut self, state: &mut WorldState) -> Result<(), SystemError> {
        if state.clock.is_every(self.config.cadence_days) {
            self.decide(state);
        }
        if state.clock.is_every(self.config.save_interval_days) {
            self.save();
        }
        Ok(())
    }

    fn on_world_reset(&mut self, ending: &WorldState) {
        for (faction, brain) in &mut self.brains {
            let extinct = ending.population.faction_members(faction).next().is_none();
            if extinct && terminal_update(&self.config, brain) {
                info!(day = ending.day(), faction = %faction, "faction died out with the world");
            }
            brain.forget_pending();
        }
        self.save();
    }

    fn flush(&mut self) {
        self.save();
    }

    fn contribute_to_report(&self, report: &mut ReportSnapshot) {
        for faction in &mut report.factions {
            faction.known_states = self.known_states(&faction.id);
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
