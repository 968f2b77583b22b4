//! Daily vital mechanics applied to each living agent.
//!
//! Order of operations for one day:
//!
//! 1. Age by 1/365 year
//! 2. Burn stamina (base + winter + extraversion + pregnancy)
//! 3. A meal restores stamina and a little health
//! 4. Starvation (no meal, or stamina exhausted) costs health, stamina floors at 0
//! 5. Death by health failure / starvation, else the old-age roll
//!
//! The old-age roll is passed in so the function itself stays deterministic.

use stoneage_types::{Agent, DeathCause};

use crate::config::VitalsConfig;

/// Outcome of one day of vital mechanics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VitalTickResult {
    /// Whether the agent starved today.
    pub starving: bool,
    /// Cause of death, if the agent died today.
    pub death: Option<DeathCause>,
}

/// Stamina an agent burns in one day before eating.
pub fn daily_burn(agent: &Agent, config: &VitalsConfig, winter: bool) -> f64 {
    let mut cost = config
        .extraversion_burn
        .mul_add(agent.personality.extraversion, config.metabolic_cost);
    if winter {
        cost += config.winter_extra_cost;
    }
    if agent.pregnant {
        cost += config.pregnancy_cost;
    }
    cost
}

/// Apply one day of vital mechanics. Dead agents are left untouched.
///
/// `old_age_roll` is a uniform sample in `[0, 1)`.
pub fn apply_daily_vitals(
    agent: &mut Agent,
    config: &VitalsConfig,
    winter: bool,
    fed: bool,
    old_age_roll: f64,
    day: u64,
) -> VitalTickResult {
    if !agent.is_alive() {
        return VitalTickResult {
            starving: false,
            death: None,
        };
    }

    agent.age += 1.0 / 365.0;

    let mut stamina = agent.stamina - daily_burn(agent, config, winter);
    if fed {
        stamina += config.meal_stamina;
        if agent.hp < agent.max_hp {
            agent.change_hp(config.meal_heal);
        }
    }
    let starving = !fed || stamina < 0.0;
    agent.stamina = stamina.clamp(0.0, agent.max_stamina);
    if starving {
        agent.change_hp(-config.starvation_damage);
    }

    let death = if agent.hp <= 0.0 {
        Some(if starving {
            DeathCause::Starvation
        } else {
            DeathCause::HealthFailure
        })
    } else if old_age_roll < config.old_age_daily_chance(agent.age) {
        Some(DeathCause::OldAge)
    } else {
        None
    };

    if let Some(cause) = death {
        agent.mark_dead(cause, day);
    }
    VitalTickResult { starving, death }
}

#[cfg(test)]
mod tests {
    use stoneage_types::{FactionId, Personality, Sex};

    use super::*;

    fn agent() -> Agent {
        let mut agent = Agent::new(FactionId::new("red_tribe"), Sex::Female, 30.0, 0);
        agent.personality = Personality::uniform(0.0);
        agent
    }

    #[test]
    fn winter_and_extraversion_raise_burn() {
        let config = VitalsConfig::default();
        let mut a = agent();
        assert!((daily_burn(&a, &config, false) - 5.0).abs() < f64::EPSILON);
        assert!((daily_burn(&a, &config, true) - 7.0).abs() < f64::EPSILON);
        a.personality.extraversion = 1.0;
        assert!((daily_burn(&a, &config, false) - 6.5).abs() < f64::EPSILON);
    }

    #[test]
    fn fed_agent_keeps_health() {
        let config = VitalsConfig::default();
        let mut a = agent();
        a.hp = 50.0;
        let result = apply_daily_vitals(&mut a, &config, false, true, 0.99, 1);
        assert!(!result.starving);
        assert!(result.death.is_none());
        assert!((a.hp - 51.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unfed_agent_starves_to_death() {
        let config = VitalsConfig::default();
        let mut a = agent();
        let mut last = None;
        for day in 1..=100 {
            last = apply_daily_vitals(&mut a, &config, false, false, 0.99, day).death;
            if last.is_some() {
                break;
            }
        }
        assert_eq!(last, Some(DeathCause::Starvation));
        assert!(!a.is_alive());
        assert!(a.stamina >= 0.0);
    }

    #[test]
    fn dead_agents_are_untouched() {
        let config = VitalsConfig::default();
        let mut a = agent();
        a.mark_dead(DeathCause::Disease, 1);
        let age = a.age;
        let result = apply_daily_vitals(&mut a, &config, true, false, 0.0, 2);
        assert!(result.death.is_none());
        assert!((a.age - age).abs() < f64::EPSILON);
        assert_eq!(a.cause_of_death(), Some(DeathCause::Disease));
    }

    #[test]
    fn elders_can_die_of_old_age() {
        let config = VitalsConfig::default();
        let mut a = agent();
        a.age = 95.0;
        let result = apply_daily_vitals(&mut a, &config, false, true, 0.0, 1);
        assert_eq!(result.death, Some(DeathCause::OldAge));
    }
}
