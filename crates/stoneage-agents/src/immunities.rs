//! Immunity relation table: one record per (agent, disease) ever exposed.

use std::collections::{BTreeMap, BTreeSet};

use stoneage_types::{AgentId, DiseaseId, ImmunityRecord};

/// Immunity records keyed by `(agent, disease)`. Records are never deleted
/// while the agent lives; [`ImmunityTable::purge`] runs only after archival.
#[derive(Debug, Clone, Default)]
pub struct ImmunityTable {
    records: BTreeMap<(AgentId, DiseaseId), ImmunityRecord>,
}

impl ImmunityTable {
    /// An empty table.
    pub const fn new() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }

    /// Register an exposure: create the record (level 0, one exposure) on
    /// first contact, otherwise bump the exposure count.
    pub fn record_exposure(&mut self, agent: AgentId, disease: DiseaseId) -> &mut ImmunityRecord {
        self.records
            .entry((agent, disease))
            .and_modify(|r| r.exposures = r.exposures.saturating_add(1))
            .or_insert_with(|| ImmunityRecord::first_exposure(agent, disease))
    }

    /// The record for a pair.
    pub fn get(&self, agent: AgentId, disease: DiseaseId) -> Option<&ImmunityRecord> {
        self.records.get(&(agent, disease))
    }

    /// The record for a pair, for mutation.
    pub fn get_mut(&mut self, agent: AgentId, disease: DiseaseId) -> Option<&mut ImmunityRecord> {
        self.records.get_mut(&(agent, disease))
    }

    /// Protection level for a pair; 0 when never exposed.
    pub fn level(&self, agent: AgentId, disease: DiseaseId) -> f64 {
        self.get(agent, disease).map_or(0.0, ImmunityRecord::level)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every record.
    pub fn iter(&self) -> impl Iterator<Item = &ImmunityRecord> {
        self.records.values()
    }

    /// Every record, for mutation.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ImmunityRecord> {
        self.records.values_mut()
    }

    /// Drop every record of the given agents.
    pub fn purge(&mut self, agents: &BTreeSet<AgentId>) {
        self.records.retain(|(agent, _), _| !agents.contains(agent));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposures_accumulate_on_one_record() {
        let mut table = ImmunityTable::new();
        let agent = AgentId::new();
        let disease = DiseaseId::new();
        assert_eq!(table.record_exposure(agent, disease).exposures, 1);
        table.record_exposure(agent, disease).raise(0.4);
        let record = table.record_exposure(agent, disease);
        assert_eq!(record.exposures, 3);
        assert!((record.level() - 0.4).abs() < f64::EPSILON);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn unknown_pair_has_no_protection() {
        let table = ImmunityTable::new();
        assert!(table.level(AgentId::new(), DiseaseId::new()).abs() < f64::EPSILON);
    }
}
