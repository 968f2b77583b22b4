//! Decoding of the nine culture actions into slider adjustments.
//!
//! Action `a` moves the mating slider by the `a / 3` component and the
//! rationing slider by the `a % 3` component, where components are
//! raise, hold and lower.

use stoneage_types::{ACTION_COUNT, FactionPolicy};

/// Raise, hold, lower.
const DIRECTIONS: [f64; 3] = [1.0, 0.0, -1.0];

/// Slider deltas `(mating, rationing)` for `action`, scaled by `step`.
/// Out-of-range actions hold both sliders.
pub fn decode(action: usize, step: f64) -> (f64, f64) {
    if action >= ACTION_COUNT {
        return (0.0, 0.0);
    }
    let mating = DIRECTIONS.get(action / 3).copied().unwrap_or(0.0);
    let rationing = DIRECTIONS.get(action % 3).copied().unwrap_or(0.0);
    (mating * step, rationing * step)
}

/// Apply `action` to `policy`. Returns whether either derived label
/// changed.
pub fn apply(policy: &mut FactionPolicy, action: usize, step: f64) -> bool {
    let before = (policy.mating_norm(), policy.rationing_norm());
    let (mating, rationing) = decode(action, step);
    policy.adjust(mating, rationing);
    before != (policy.mating_norm(), policy.rationing_norm())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_holds_both_sliders() {
        assert_eq!(decode(4, 0.1), (0.0, 0.0));
    }

    #[test]
    fn corner_actions_move_both_sliders() {
        let (m, r) = decode(0, 0.1);
        assert!((m - 0.1).abs() < f64::EPSILON && (r - 0.1).abs() < f64::EPSILON);
        let (m, r) = decode(8, 0.1);
        assert!((m + 0.1).abs() < f64::EPSILON && (r + 0.1).abs() < f64::EPSILON);
        let (m, r) = decode(2, 0.1);
        assert!((m - 0.1).abs() < f64::EPSILON && (r + 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn sliders_stay_clamped_under_repeated_actions() {
        let mut policy = FactionPolicy::default();
        for i in 0..1_000 {
            apply(&mut policy, if i % 7 == 0 { 8 } else { 0 }, 0.1);
            assert!((0.0..=1.0).contains(&policy.mating_strictness()));
            assert!((0.0..=1.0).contains(&policy.rationing_strictness()));
        }
        for _ in 0..50 {
            apply(&mut policy, 8, 0.1);
        }
        assert!(policy.mating_strictness().abs() < f64::EPSILON);
    }

    #[test]
    fn label_change_is_reported() {
        let mut policy = FactionPolicy::new(0.6, 0.5);
        assert!(apply(&mut policy, 1, 0.1));
        assert!(!apply(&mut policy, 4, 0.1));
    }
}
