//! Configuration constants and defaults for vitals and spawning.
//!
//! The [`VitalsConfig`] and [`SpawnConfig`] structs bundle every tunable so
//! that callers (the biology system, tests) can override defaults. Both
//! deserialize from the `biology` section of the kernel configuration; every
//! missing key falls back to its default.

use serde::Deserialize;

/// Configuration for the daily vital mechanics.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct VitalsConfig {
    /// Hit points of a new agent (default: 100).
    pub max_hp: f64,

    /// Stamina of a new agent (default: 100).
    pub max_stamina: f64,

    /// Stamina burned per day before modifiers (default: 5).
    pub metabolic_cost: f64,

    /// Extra stamina burned per day in winter (default: 2).
    pub winter_extra_cost: f64,

    /// Stamina burned per day per unit of extraversion (default: 1.5).
    pub extraversion_burn: f64,

    /// Extra stamina burned per day while pregnant (default: 5).
    pub pregnancy_cost: f64,

    /// Hit points lost on a day the agent starves (default: 5).
    pub starvation_damage: f64,

    /// Stamina restored by a meal (default: 10).
    pub meal_stamina: f64,

    /// Hit points restored by a meal when below maximum (default: 1).
    pub meal_heal: f64,

    /// Age in years after which natural death becomes possible (default: 80).
    pub old_age_onset: f64,

    /// Annual natural-death chance at the onset age (default: 0.10).
    pub old_age_base_chance: f64,

    /// Additional annual chance per year past the onset (default: 0.02).
    pub old_age_chance_per_year: f64,
}

impl Default for VitalsConfig {
    fn default() -> Self {
        Self {
            max_hp: 100.0,
            max_stamina: 100.0,
            metabolic_cost: 5.0,
            winter_extra_cost: 2.0,
            extraversion_burn: 1.5,
            pregnancy_cost: 5.0,
            starvation_damage: 5.0,
            meal_stamina: 10.0,
            meal_heal: 1.0,
            old_age_onset: 80.0,
            old_age_base_chance: 0.10,
            old_age_chance_per_year: 0.02,
        }
    }
}

impl VitalsConfig {
    /// Daily probability of dying of old age at `age`.
    ///
    /// Zero before the onset; afterwards the annual chance
    /// `base + (age - onset) * per_year` spread over 365 days, capped at 1.
    pub fn old_age_daily_chance(&self, age: f64) -> f64 {
        if age <= self.old_age_onset {
            return 0.0;
        }
        let annual = self.old_age_chance_per_year.mul_add(age - self.old_age_onset, self.old_age_base_chance);
        (annual / 365.0).clamp(0.0, 1.0)
    }
}

/// Configuration for creating agents at world start and at birth.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Initial agents get a uniform age in `[0, initial_max_age)` (default: 60).
    pub initial_max_age: f64,

    /// Initial agents get a uniform genetic vulnerability in
    /// `[0, initial_max_vulnerability)` (default: 0.1).
    pub initial_max_vulnerability: f64,

    /// Age at which a child takes an adult role (default: 16).
    pub adult_age: f64,

    /// Half-width of the uniform noise added to inherited personality (default: 0.1).
    pub personality_jitter: f64,

    /// Half-width of the uniform noise added to inherited vulnerability (default: 0.05).
    pub vulnerability_jitter: f64,

    /// Vulnerability added to a child whose parents share a family (default: 0.2).
    pub inbreeding_penalty: f64,

    /// Chance an adult takes the hunter role (default: 0.3).
    pub hunter_chance: f64,

    /// Chance an adult takes the healer role (default: 0.1).
    pub healer_chance: f64,

    /// Chance an initial adult starts with a stone tool (default: 0.25).
    pub starting_tool_chance: f64,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            initial_max_age: 60.0,
            initial_max_vulnerability: 0.1,
            adult_age: 16.0,
            personality_jitter: 0.1,
            vulnerability_jitter: 0.05,
            inbreeding_penalty: 0.2,
            hunter_chance: 0.3,
            healer_chance: 0.1,
            starting_tool_chance: 0.25,
        }
    }
}
