//! Infection relation table: at most one record per (agent, disease).

use std::collections::{BTreeMap, BTreeSet};

use stoneage_types::{AgentId, DiseaseId, InfectionRecord};

/// Infection records keyed by `(agent, disease)`.
///
/// The composite key makes a second record for the same pair
/// unrepresentable.
#[derive(Debug, Clone, Default)]
pub struct InfectionTable {
    records: BTreeMap<(AgentId, DiseaseId), InfectionRecord>,
}

impl InfectionTable {
    /// An empty table.
    pub const fn new() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }

    /// Insert a record unless one already exists for the pair.
    ///
    /// Returns `false` (leaving the existing record untouched) on a clash.
    pub fn insert(&mut self, record: InfectionRecord) -> bool {
        let key = (record.agent_id, record.disease_id);
        if self.records.contains_key(&key) {
            return false;
        }
        self.records.insert(key, record);
        true
    }

    /// Whether the agent has any record (active or dormant) for the disease.
    pub fn contains(&self, agent: AgentId, disease: DiseaseId) -> bool {
        self.records.contains_key(&(agent, disease))
    }

    /// The record for a pair.
    pub fn get(&self, agent: AgentId, disease: DiseaseId) -> Option<&InfectionRecord> {
        self.records.get(&(agent, disease))
    }

    /// The record for a pair, for mutation.
    pub fn get_mut(&mut self, agent: AgentId, disease: DiseaseId) -> Option<&mut InfectionRecord> {
        self.records.get_mut(&(agent, disease))
    }

    /// Delete the record for a pair.
    pub fn remove(&mut self, agent: AgentId, disease: DiseaseId) -> Option<InfectionRecord> {
        self.records.remove(&(agent, disease))
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
    pub fn iter(&self) -> impl Iterator<Item = &InfectionRecord> {
        self.records.values()
    }

    /// Every record, for mutation.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut InfectionRecord> {
        self.records.values_mut()
    }

    /// Records of one agent.
    pub fn for_agent(&self, agent: AgentId) -> impl Iterator<Item = &InfectionRecord> {
        self.records.values().filter(move |r| r.agent_id == agent)
    }

    /// Records of one disease.
    pub fn for_disease(&self, disease: DiseaseId) -> impl Iterator<Item = &InfectionRecord> {
        self.records.values().filter(move |r| r.disease_id == disease)
    }

    /// Keep only records for which `keep` returns true.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&InfectionRecord) -> bool,
    {
        self.records.retain(|_, r| keep(r));
    }

    /// Drop every record of the given agents.
    pub fn purge(&mut self, agents: &BTreeSet<AgentId>) {
        self.records.retain(|(agent, _), _| !agents.contains(agent));
    }
}
