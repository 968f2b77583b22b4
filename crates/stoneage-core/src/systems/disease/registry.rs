//! Owned registry of procedurally generated diseases.
//!
//! Each disease subsystem instance owns its registry; there is no
//! process-wide table, so independent worlds (and tests) never share
//! pathogens. Definitions are immutable once registered.

use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::IndexedRandom;
use stoneage_types::{DiseaseDefinition, DiseaseId, ImmunityKind, SeverityEffects};

use crate::chance::roll;

const PREFIXES: [&str; 8] = [
    "Crimson", "Shaking", "Burning", "Pale", "Black", "Silent", "Rabid", "Weeping",
];

const ROOTS: [&str; 7] = ["Lung", "Blood", "Gut", "Bone", "Skin", "Brain", "Eye"];

const SUFFIXES: [&str; 8] = [
    "Rot", "Fever", "Pox", "Blight", "Plague", "Cough", "Flux", "Withering",
];

/// Diseases known to one world.
#[derive(Debug, Clone, Default)]
pub struct DiseaseRegistry {
    diseases: BTreeMap<DiseaseId, DiseaseDefinition>,
}

impl DiseaseRegistry {
    /// An empty registry.
    pub const fn new() -> Self {
        Self {
            diseases: BTreeMap::new(),
        }
    }

    /// Add a definition. Returns its id.
    pub fn register(&mut self, disease: DiseaseDefinition) -> DiseaseId {
        let id = disease.id;
        self.diseases.insert(id, disease);
        id
    }

    /// Definition by id.
    pub fn get(&self, id: &DiseaseId) -> Option<&DiseaseDefinition> {
        self.diseases.get(id)
    }

    /// Number of known diseases, inert ones included.
    pub fn len(&self) -> usize {
        self.diseases.len()
    }

    /// Whether no disease has emerged.
    pub fn is_empty(&self) -> bool {
        self.diseases.is_empty()
    }

    /// Every definition in id order.
    pub fn iter(&self) -> impl Iterator<Item = &DiseaseDefinition> {
        self.diseases.values()
    }

    /// Forget every disease.
    pub fn clear(&mut self) {
        self.diseases.clear();
    }
}

/// Generate a name such as "Crimson Lung Rot".
pub fn disease_name(rng: &mut impl Rng) -> String {
    let prefix = PREFIXES.choose(rng).copied().unwrap_or("Grey");
    let root = ROOTS.choose(rng).copied().unwrap_or("Blood");
    let suffix = SUFFIXES.choose(rng).copied().unwrap_or("Fever");
    format!("{prefix} {root} {suffix}")
}

/// Generate a random pathogen.
///
/// Transmission is skewed toward the low end of `[0.02, 0.45]` and lethality
/// toward zero within `[0, 0.25]`, so most diseases are mild and a few are
/// dangerous.
pub fn generate_disease(rng: &mut impl Rng, day: u64) -> DiseaseDefinition {
    // Stand-ins for Beta(2, 5) transmission and Beta(1, 10) lethality: U^k is Beta(1/k, 1).
    let transmission = 0.43f64.mul_add(rng.random::<f64>().powi(2), 0.02);
    let lethality = 0.25 * rng.random::<f64>().powi(3);
    let duration = rng.random_range(3..=14_u32);
    let chronic = roll(rng, 0.2);
    let immunity = match rng.random_range(0..3_u8) {
        0 => ImmunityKind::Sterilizing,
        1 => ImmunityKind::Waning,
        _ => ImmunityKind::Sensitizing,
    };
    let stamina = if roll(rng, 0.8) {
        -rng.random_range(5.0..=20.0)
    } else {
        0.0
    };
    let hp = if roll(rng, 0.3) || lethality > 0.1 {
        -rng.random_range(1.0..=5.0)
    } else {
        0.0
    };
    DiseaseDefinition {
        id: DiseaseId::new(),
        name: disease_name(rng),
        transmission,
        lethality,
        duration,
        effects: SeverityEffects { hp, stamina },
        chronic,
        immunity,
        emerged_on_day: day,
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn generated_diseases_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for day in 0..500 {
            let d = generate_disease(&mut rng, day);
            assert!((0.02..=0.45).contains(&d.transmission));
            assert!((0.0..=0.25).contains(&d.lethality));
            assert!((3..=14).contains(&d.duration));
            assert!(d.effects.hp <= 0.0 && d.effects.hp >= -5.0);
            assert!(d.effects.stamina <= 0.0 && d.effects.stamina >= -20.0);
            assert_eq!(d.name.split(' ').count(), 3);
            assert_eq!(d.emerged_on_day, day);
        }
    }

    #[test]
    fn draws_skew_toward_mild_diseases() {
        let mut rng = StdRng::seed_from_u64(77);
        let n = 4_000_u32;
        let (mut transmission, mut lethality) = (0.0, 0.0);
        for _ in 0..n {
            let d = generate_disease(&mut rng, 0);
            transmission += d.transmission;
            lethality += d.lethality;
        }
        let n = f64::from(n);
        // Expected means: 0.02 + 0.43 / 3 and 0.25 / 4.
        assert!((transmission / n - 0.163).abs() < 0.02);
        assert!((lethality / n - 0.0625).abs() < 0.015);
    }

    #[test]
    fn lethal_diseases_always_hurt() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..500 {
            let d = generate_disease(&mut rng, 0);
            if d.lethality > 0.1 {
                assert!(d.effects.hp < 0.0);
            }
        }
    }

    #[test]
    fn registries_are_independent() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut a = DiseaseRegistry::new();
        let b = DiseaseRegistry::new();
        let id = a.register(generate_disease(&mut rng, 0));
        assert!(a.get(&id).is_some());
        assert!(b.get(&id).is_none());
        a.clear();
        assert!(a.is_empty());
    }
}
