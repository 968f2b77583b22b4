//! One faction's independent Q-learning agent.

use rand::Rng;
use rand::seq::IndexedRandom;
use stoneage_types::{ACTION_COUNT, QTable, StateKey};

use crate::chance::roll;

/// Q-table plus the pending state-action awaiting its reward.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactionBrain {
    q: QTable,
    last: Option<(StateKey, usize)>,
    updates: u64,
}

impl FactionBrain {
    /// A brain with no experience.
    pub const fn new() -> Self {
        Self {
            q: QTable::new(),
            last: None,
            updates: 0,
        }
    }

    /// Resume from a persisted table. Nothing is pending.
    pub const fn from_table(q: QTable) -> Self {
        Self {
            q,
            last: None,
            updates: 0,
        }
    }

    /// The learned values.
    pub const fn table(&self) -> &QTable {
        &self.q
    }

    /// Number of distinct states seen.
    pub fn known_states(&self) -> usize {
        self.q.len()
    }

    /// TD updates applied since construction or reset.
    pub const fn updates(&self) -> u64 {
        self.updates
    }

    /// The state-action still waiting for its reward.
    pub const fn pending(&self) -> Option<(StateKey, usize)> {
        self.last
    }

    /// Apply the temporal-difference update to the pending state-action.
    ///
    /// `next` is the state observed now; `None` marks a terminal
    /// transition, which is not bootstrapped. Does nothing when no action
    /// is pending. Returns the new value, if one was written.
    pub fn learn(&mut self, reward: f64, next: Option<&StateKey>, alpha: f64, gamma: f64) -> Option<f64> {
        let (state, action) = self.last?;
        let future = next.map_or(0.0, |s| self.q.max_value(s));
        let slot = self.q.values_mut(state).get_mut(action)?;
        let target = gamma.mul_add(future, reward);
        *slot = alpha.mul_add(target - *slot, *slot);
        self.updates = self.updates.saturating_add(1);
        Some(*slot)
    }

    /// Epsilon-greedy choice for `state`, recording it as pending.
    ///
    /// The state's row is created if unseen. Greedy ties are broken
    /// uniformly at random.
    pub fn act(&mut self, rng: &mut impl Rng, state: StateKey, epsilon: f64) -> usize {
        self.q.values_mut(state);
        let action = if roll(rng, epsilon) {
            rng.random_range(0..ACTION_COUNT)
        } else {
            self.q.best_actions(&state).choose(rng).copied().unwrap_or(0)
        };
        self.last = Some((state, action));
        action
    }

    /// Drop the pending state-action without learning from it.
    pub const fn forget_pending(&mut self) {
        self.last = None;
    }

    /// Wipe everything learned.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
