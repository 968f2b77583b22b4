//! Agent creation: the founding population and children born in the run.
//!
//! Founders have no parents and fully random traits. Children inherit the
//! mother's faction and lineage, a blend of both parents' personalities and
//! an averaged genetic vulnerability, each with small uniform noise. Parents
//! who share a lineage pass on an inbreeding penalty.

use rand::Rng;
use stoneage_types::{Agent, FactionId, Personality, Role, Sex};

use crate::config::{SpawnConfig, VitalsConfig};

/// Uniform sample in `[low, high)`; degenerate ranges return `low`.
fn uniform(rng: &mut impl Rng, low: f64, high: f64) -> f64 {
    if high > low {
        rng.random::<f64>().mul_add(high - low, low)
    } else {
        low
    }
}

fn random_sex(rng: &mut impl Rng) -> Sex {
    if rng.random_bool(0.5) { Sex::Male } else { Sex::Female }
}

fn random_personality(rng: &mut impl Rng) -> Personality {
    Personality {
        openness: rng.random(),
        conscientiousness: rng.random(),
        extraversion: rng.random(),
        agreeableness: rng.random(),
        neuroticism: rng.random(),
    }
}

/// Role for an agent of the given age: children until `adult_age`, then a
/// random working role.
pub fn role_for_age(rng: &mut impl Rng, age: f64, config: &SpawnConfig) -> Role {
    if age < config.adult_age {
        return Role::Child;
    }
    let roll: f64 = rng.random();
    if roll < config.healer_chance {
        Role::Healer
    } else if roll < config.healer_chance + config.hunter_chance {
        Role::Hunter
    } else {
        Role::Gatherer
    }
}

/// A founding member of `faction`, created at world initialisation.
pub fn founder(
    rng: &mut impl Rng,
    faction: FactionId,
    day: u64,
    vitals: &VitalsConfig,
    config: &SpawnConfig,
) -> Agent {
    let age = uniform(rng, 0.0, config.initial_max_age);
    let mut agent = Agent::new(faction, random_sex(rng), age, day);
    agent.max_hp = vitals.max_hp;
    agent.hp = vitals.max_hp;
    agent.max_stamina = vitals.max_stamina;
    agent.stamina = vitals.max_stamina;
    agent.role = role_for_age(rng, age, config);
    agent.personality = random_personality(rng);
    agent.genetic_vulnerability = uniform(rng, 0.0, config.initial_max_vulnerability).clamp(0.0, 1.0);
    agent
}

/// Mix two parent personalities: per-dimension mean plus uniform noise of
/// half-width `jitter`, clamped to `[0, 1]`.
pub fn blend_personality(
    rng: &mut impl Rng,
    mother: &Personality,
    father: &Personality,
    jitter: f64,
) -> Personality {
    let mut mix = |a: f64, b: f64| f64::midpoint(a, b) + uniform(rng, -jitter, jitter);
    Personality {
        openness: mix(mother.openness, father.openness),
        conscientiousness: mix(mother.conscientiousness, father.conscientiousness),
        extraversion: mix(mother.extraversion, father.extraversion),
        agreeableness: mix(mother.agreeableness, father.agreeableness),
        neuroticism: mix(mother.neuroticism, father.neuroticism),
    }
    .clamped()
}

/// A newborn of `mother` and, when still resolvable, `father`.
///
/// Without a father the child inherits from the mother alone.
pub fn child_of(
    rng: &mut impl Rng,
    mother: &Agent,
    father: Option<&Agent>,
    day: u64,
    vitals: &VitalsConfig,
    config: &SpawnConfig,
) -> Agent {
    let mut child = Agent::new(mother.faction_id.clone(), random_sex(rng), 0.0, day);
    child.family_id = mother.family_id;
    child.mother_id = Some(mother.id);
    child.father_id = father.map(|f| f.id);
    child.role = Role::Child;
    child.max_hp = vitals.max_hp;
    child.hp = vitals.max_hp;
    child.max_stamina = vitals.max_stamina;
    child.stamina = vitals.max_stamina;

    let father_personality = father.map_or(mother.personality, |f| f.personality);
    child.personality = blend_personality(rng, &mother.personality, &father_personality, config.personality_jitter);

    let father_vulnerability = father.map_or(mother.genetic_vulnerability, |f| f.genetic_vulnerability);
    let inbred = father.is_some_and(|f| f.family_id == mother.family_id);
    let penalty = if inbred { config.inbreeding_penalty } else { 0.0 };
    let noise = uniform(rng, -config.vulnerability_jitter, config.vulnerability_jitter);
    child.genetic_vulnerability =
        (f64::midpoint(mother.genetic_vulnerability, father_vulnerability) + noise + penalty).clamp(0.0, 1.0);
    child
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn parent(rng: &mut StdRng, sex: Sex) -> Agent {
        let mut agent = founder(
            rng,
            FactionId::new("blue_tribe"),
            0,
            &VitalsConfig::default(),
            &SpawnConfig::default(),
        );
        agent.sex = sex;
        agent.age = 25.0;
        agent
    }

    #[test]
    fn founders_respect_configured_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        let config = SpawnConfig::default();
        for _ in 0..200 {
            let agent = founder(&mut rng, FactionId::new("red_tribe"), 0, &VitalsConfig::default(), &config);
            assert!((0.0..config.initial_max_age).contains(&agent.age));
            assert!((0.0..=config.initial_max_vulnerability).contains(&agent.genetic_vulnerability));
            assert_eq!(agent.role == Role::Child, agent.age < config.adult_age);
            assert!(agent.is_alive());
        }
    }

    #[test]
    fn child_inherits_lineage_and_faction() {
        let mut rng = StdRng::seed_from_u64(11);
        let mother = parent(&mut rng, Sex::Female);
        let father = parent(&mut rng, Sex::Male);
        let child = child_of(&mut rng, &mother, Some(&father), 400, &VitalsConfig::default(), &SpawnConfig::default());
        assert_eq!(child.faction_id, mother.faction_id);
        assert_eq!(child.family_id, mother.family_id);
        assert_eq!(child.mother_id, Some(mother.id));
        assert_eq!(child.father_id, Some(father.id));
        assert_eq!(child.role, Role::Child);
        assert_eq!(child.born_on_day, 400);
        assert!(child.age.abs() < f64::EPSILON);
    }

    #[test]
    fn shared_lineage_raises_vulnerability() {
        let mut rng = StdRng::seed_from_u64(3);
        let config = SpawnConfig {
            vulnerability_jitter: 0.0,
            ..SpawnConfig::default()
        };
        let mother = parent(&mut rng, Sex::Female);
        let mut brother = parent(&mut rng, Sex::Male);
        brother.family_id = mother.family_id;
        brother.genetic_vulnerability = mother.genetic_vulnerability;
        let child = child_of(&mut rng, &mother, Some(&brother), 1, &VitalsConfig::default(), &config);
        let expected = (mother.genetic_vulnerability + config.inbreeding_penalty).min(1.0);
        assert!((child.genetic_vulnerability - expected).abs() < 1e-9);
    }

    #[test]
    fn fatherless_child_inherits_from_mother_only() {
        let mut rng = StdRng::seed_from_u64(5);
        let mother = parent(&mut rng, Sex::Female);
        let config = SpawnConfig {
            personality_jitter: 0.0,
            vulnerability_jitter: 0.0,
            ..SpawnConfig::default()
        };
        let child = child_of(&mut rng, &mother, None, 1, &VitalsConfig::default(), &config);
        assert_eq!(child.father_id, None);
        assert!((child.personality.openness - mother.personality.openness).abs() < 1e-12);
        assert!((child.genetic_vulnerability - mother.genetic_vulnerability).abs() < 1e-12);
    }
}
