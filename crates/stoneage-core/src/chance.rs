//! Probability helpers shared by the systems.

use rand::Rng;

/// Bernoulli trial: `true` with probability `p`.
///
/// Values outside `[0, 1]` saturate and NaN never succeeds, so a bad
/// configuration value cannot panic inside a tick.
pub fn roll(rng: &mut impl Rng, p: f64) -> bool {
    rng.random::<f64>() < p
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn degenerate_probabilities() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            assert!(!roll(&mut rng, 0.0));
            assert!(!roll(&mut rng, f64::NAN));
            assert!(!roll(&mut rng, -1.0));
            assert!(roll(&mut rng, 1.0));
            assert!(roll(&mut rng, 3.0));
        }
    }
}
