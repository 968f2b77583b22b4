//! Skill proficiency table.
//!
//! Levels are continuous in `[0, 1]`. An agent without a record has level 0.

use std::collections::{BTreeMap, BTreeSet};

use stoneage_types::{AgentId, SkillRecord};

/// Skill used when gathering food.
pub const FORAGING: &str = "foraging";

/// Skill used when tending the sick.
pub const HEALING: &str = "healing";

/// Skill records keyed by `(agent, skill)`.
#[derive(Debug, Clone, Default)]
pub struct SkillTable {
    records: BTreeMap<(AgentId, String), SkillRecord>,
}

impl SkillTable {
    /// An empty table.
    pub const fn new() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }

    /// Level of `skill` for `agent`; 0 when unknown.
    pub fn level(&self, agent: AgentId, skill: &str) -> f64 {
        self.records
            .get(&(agent, skill.to_owned()))
            .map_or(0.0, |r| r.level)
    }

    /// Overwrite a level, clamped to `[0, 1]`.
    pub fn set(&mut self, agent: AgentId, skill: &str, level: f64) {
        let level = level.clamp(0.0, 1.0);
        self.records
            .entry((agent, skill.to_owned()))
            .and_modify(|r| r.level = level)
            .or_insert_with(|| SkillRecord {
                agent_id: agent,
                skill: skill.to_owned(),
                level,
            });
    }

    /// Practice: move the level toward 1 by `rate` of the remaining gap.
    /// Returns the new level.
    pub fn practice(&mut self, agent: AgentId, skill: &str, rate: f64) -> f64 {
        let current = self.level(agent, skill);
        let next = (1.0 - current).mul_add(rate.clamp(0.0, 1.0), current);
        self.set(agent, skill, next);
        next
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records of one agent.
    pub fn for_agent(&self, agent: AgentId) -> impl Iterator<Item = &SkillRecord> {
        self.records.values().filter(move |r| r.agent_id == agent)
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
    fn practice_approaches_but_never_exceeds_one() {
        let mut table = SkillTable::new();
        let agent = AgentId::new();
        let mut level = 0.0;
        for _ in 0..1_000 {
            level = table.practice(agent, FORAGING, 0.05);
        }
        assert!(level <= 1.0);
        assert!(level > 0.99);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn set_clamps() {
        let mut table = SkillTable::new();
        let agent = AgentId::new();
        table.set(agent, HEALING, 7.0);
        assert!((table.level(agent, HEALING) - 1.0).abs() < f64::EPSILON);
        assert!(table.level(agent, FORAGING).abs() < f64::EPSILON);
    }
}
