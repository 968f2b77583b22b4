//! Tabular Q-learning state: discretized observations and per-faction
//! action-value tables.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::{GeneticBand, PopulationBand, ResourceBand};

/// Number of discrete policy actions: 3 mating adjustments x 3 rationing
/// adjustments.
pub const ACTION_COUNT: usize = 9;

/// Discretized observation of a faction, the key of its Q-table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StateKey {
    /// Headcount band.
    pub population: PopulationBand,
    /// Mean genetic vulnerability band.
    pub genetics: GeneticBand,
    /// Food-per-capita band.
    pub resources: ResourceBand,
}

impl core::fmt::Display for StateKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {}, {})", self.population, self.genetics, self.resources)
    }
}

/// Action values for every state a faction has observed.
///
/// The table only grows: entries are created with all-zero values the first
/// time a state is touched and never removed except by an explicit reset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QTable {
    entries: BTreeMap<StateKey, [f64; ACTION_COUNT]>,
}

impl QTable {
    /// An empty table.
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Number of known states.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no state has been observed yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `state` has an entry.
    pub fn contains(&self, state: &StateKey) -> bool {
        self.entries.contains_key(state)
    }

    /// Values for `state`, if known.
    pub fn values(&self, state: &StateKey) -> Option<&[f64; ACTION_COUNT]> {
        self.entries.get(state)
    }

    /// Values for `state`, creating an all-zero entry on first touch.
    pub fn values_mut(&mut self, state: StateKey) -> &mut [f64; ACTION_COUNT] {
        self.entries.entry(state).or_insert([0.0; ACTION_COUNT])
    }

    /// Insert or replace the values of `state`.
    pub fn insert(&mut self, state: StateKey, values: [f64; ACTION_COUNT]) {
        self.entries.insert(state, values);
    }

    /// Iterate over all entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, &[f64; ACTION_COUNT])> {
        self.entries.iter()
    }

    /// Highest action value for `state`; 0 for an unseen state.
    pub fn max_value(&self, state: &StateKey) -> f64 {
        self.entries
            .get(state)
            .map_or(0.0, |values| values.iter().copied().fold(f64::NEG_INFINITY, f64::max))
    }

    /// Indices of every action sharing the highest value, in ascending order.
    /// An unseen state ties all actions.
    pub fn best_actions(&self, state: &StateKey) -> Vec<usize> {
        let Some(values) = self.entries.get(state) else {
            return (0..ACTION_COUNT).collect();
        };
        let best = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        values
            .iter()
            .enumerate()
            .filter(|(_, value)| (**value - best).abs() <= f64::EPSILON)
            .map(|(idx, _)| idx)
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn key() -> StateKey {
        StateKey {
            population: PopulationBand::Healthy,
            genetics: GeneticBand::Pure,
            resources: ResourceBand::Abundant,
        }
    }

    #[test]
    fn values_mut_grows_table_with_zeros() {
        let mut table = QTable::new();
        assert!(table.is_empty());
        let values = table.values_mut(key());
        assert_eq!(*values, [0.0; ACTION_COUNT]);
        assert_eq!(table.len(), 1);
        assert!(table.contains(&key()));
    }

    #[test]
    fn best_actions_reports_every_tie() {
        let mut table = QTable::new();
        assert_eq!(table.best_actions(&key()).len(), ACTION_COUNT);
        let mut values = [0.0; ACTION_COUNT];
        values[4] = 2.0;
        values[7] = 2.0;
        table.insert(key(), values);
        assert_eq!(table.best_actions(&key()), vec![4, 7]);
        assert!((table.max_value(&key()) - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn state_key_display() {
        assert_eq!(key().to_string(), "(HEALTHY, PURE, ABUNDANT)");
    }
}
