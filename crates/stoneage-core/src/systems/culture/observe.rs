//! Per-faction observation: aggregate statistics, discretization and reward.

use stoneage_types::{FactionId, GeneticBand, PopulationBand, ResourceBand, StateKey};

use crate::config::CultureConfig;
use crate::state::WorldState;

/// Aggregated view of one faction at evaluation time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactionStats {
    /// Living members.
    pub living: usize,
    /// Food in the faction store.
    pub food: f64,
    /// Mean genetic vulnerability of living members (0 when empty).
    pub mean_vulnerability: f64,
    /// Mean hit-point fraction of living members (0 when empty).
    pub mean_hp_fraction: f64,
}

impl FactionStats {
    /// Food per living member. An empty faction has none.
    pub fn food_per_capita(&self) -> f64 {
        if self.living == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let living = self.living as f64;
        self.food / living
    }

    /// Whether the faction has died out.
    pub const fn is_extinct(&self) -> bool {
        self.living == 0
    }
}

/// Aggregate the living members of `faction`.
pub fn gather(state: &WorldState, faction: &FactionId) -> FactionStats {
    let mut living = 0_usize;
    let mut vulnerability = 0.0;
    let mut hp_fraction = 0.0;
    for agent in state.population.faction_members(faction) {
        living = living.saturating_add(1);
        vulnerability += agent.genetic_vulnerability;
        hp_fraction += agent.hp_fraction();
    }
    let food = state.faction(faction).map_or(0.0, |f| f.food);
    if living == 0 {
        return FactionStats {
            living,
            food,
            mean_vulnerability: 0.0,
            mean_hp_fraction: 0.0,
        };
    }
    #[allow(clippy::cast_precision_loss)]
    let n = living as f64;
    FactionStats {
        living,
        food,
        mean_vulnerability: vulnerability / n,
        mean_hp_fraction: hp_fraction / n,
    }
}

/// Map aggregate statistics to the discrete learning state.
pub fn discretize(config: &CultureConfig, stats: &FactionStats) -> StateKey {
    let population = if stats.living < config.critical_population {
        PopulationBand::Critical
    } else if stats.living < config.low_population {
        PopulationBand::Low
    } else {
        PopulationBand::Healthy
    };
    let genetics = if stats.mean_vulnerability < config.pure_vulnerability {
        GeneticBand::Pure
    } else if stats.mean_vulnerability < config.mixed_vulnerability {
        GeneticBand::Mixed
    } else {
        GeneticBand::Degenerated
    };
    let per_capita = stats.food_per_capita();
    let resources = if per_capita < config.famine_food {
        ResourceBand::Famine
    } else if per_capita < config.scarce_food {
        ResourceBand::Scarce
    } else {
        ResourceBand::Abundant
    };
    StateKey {
        population,
        genetics,
        resources,
    }
}

/// Reward for the interval that ended with `stats`.
pub fn reward(config: &CultureConfig, stats: &FactionStats) -> f64 {
    if stats.is_extinct() {
        return config.extinction_reward;
    }
    let mut reward = config.survival_reward;
    if stats.mean_vulnerability > config.high_vulnerability {
        reward += config.high_vulnerability_penalty;
    } else if stats.mean_vulnerability > config.moderate_vulnerability {
        reward += config.moderate_vulnerability_penalty;
    }
    if stats.food_per_capita() < config.hunger_food {
        reward += config.hunger_penalty;
    }
    if stats.mean_hp_fraction < config.frail_hp_fraction {
        reward += config.frail_penalty;
    } else if stats.mean_hp_fraction < config.weak_hp_fraction {
        reward += config.weak_penalty;
    }
    reward
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(living: usize, food: f64, vulnerability: f64, hp: f64) -> FactionStats {
        FactionStats {
            living,
            food,
            mean_vulnerability: vulnerability,
            mean_hp_fraction: hp,
        }
    }

    #[test]
    fn tiny_sick_starving_faction_is_worst_state() {
        let key = discretize(&CultureConfig::default(), &stats(5, 1.0, 0.9, 1.0));
        assert_eq!(key.population, PopulationBand::Critical);
        assert_eq!(key.genetics, GeneticBand::Degenerated);
        assert_eq!(key.resources, ResourceBand::Famine);
        assert_eq!(key.to_string(), "(CRITICAL, DEGENERATED, FAMINE)");
    }

    #[test]
    fn large_healthy_faction_is_best_state() {
        let key = discretize(&CultureConfig::default(), &stats(500, 500.0 * 30.0, 0.05, 1.0));
        assert_eq!(key.population, PopulationBand::Healthy);
        assert_eq!(key.genetics, GeneticBand::Pure);
        assert_eq!(key.resources, ResourceBand::Abundant);
    }

    #[test]
    fn band_edges_fall_into_upper_band() {
        let config = CultureConfig::default();
        let key = discretize(&config, &stats(50, 50.0 * 5.0, 0.2, 1.0));
        assert_eq!(key.population, PopulationBand::Low);
        assert_eq!(key.genetics, GeneticBand::Mixed);
        assert_eq!(key.resources, ResourceBand::Scarce);
    }

    #[test]
    fn healthy_faction_earns_survival_reward() {
        let config = CultureConfig::default();
        let r = reward(&config, &stats(100, 1_000.0, 0.1, 0.9));
        assert!((r - config.survival_reward).abs() < f64::EPSILON);
    }

    #[test]
    fn penalties_stack() {
        let config = CultureConfig::default();
        let r = reward(&config, &stats(100, 10.0, 0.9, 0.1));
        let expected = config.survival_reward
            + config.high_vulnerability_penalty
            + config.hunger_penalty
            + config.frail_penalty;
        assert!((r - expected).abs() < 1e-12);
    }

    #[test]
    fn extinction_overrides_everything() {
        let config = CultureConfig::default();
        let r = reward(&config, &stats(0, 1_000.0, 0.0, 1.0));
        assert!((r - config.extinction_reward).abs() < f64::EPSILON);
    }
}
