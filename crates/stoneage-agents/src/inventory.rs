//! Item holdings per agent.

use std::collections::{BTreeMap, BTreeSet};

use stoneage_types::{AgentId, InventoryRecord};

use crate::error::AgentError;

/// Item that boosts foraging yield while held.
pub const STONE_TOOL: &str = "stone_tool";

/// Inventory records keyed by `(agent, item)`. Empty holdings are removed.
#[derive(Debug, Clone, Default)]
pub struct InventoryTable {
    records: BTreeMap<(AgentId, String), InventoryRecord>,
}

impl InventoryTable {
    /// An empty table.
    pub const fn new() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }

    /// Units of `item` held by `agent`.
    pub fn amount(&self, agent: AgentId, item: &str) -> u32 {
        self.records
            .get(&(agent, item.to_owned()))
            .map_or(0, |r| r.amount)
    }

    /// Whether `agent` holds at least one `item`.
    pub fn has(&self, agent: AgentId, item: &str) -> bool {
        self.amount(agent, item) > 0
    }

    /// Add units, saturating at `u32::MAX`.
    pub fn add(&mut self, agent: AgentId, item: &str, amount: u32) {
        if amount == 0 {
            return;
        }
        self.records
            .entry((agent, item.to_owned()))
            .and_modify(|r| r.amount = r.amount.saturating_add(amount))
            .or_insert_with(|| InventoryRecord {
                agent_id: agent,
                item: item.to_owned(),
                amount,
            });
    }

    /// Remove units.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InsufficientItem`] if the agent holds fewer than
    /// `amount`; nothing is removed in that case.
    pub fn take(&mut self, agent: AgentId, item: &str, amount: u32) -> Result<(), AgentError> {
        let available = self.amount(agent, item);
        let remaining = available
            .checked_sub(amount)
            .ok_or_else(|| AgentError::InsufficientItem {
                agent_id: agent,
                item: item.to_owned(),
                requested: amount,
                available,
            })?;
        let key = (agent, item.to_owned());
        if remaining == 0 {
            self.records.remove(&key);
        } else if let Some(record) = self.records.get_mut(&key) {
            record.amount = remaining;
        }
        Ok(())
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every record of the given agents.
    pub fn purge(&mut self, agents: &BTreeSet<AgentId>) {
        self.records.retain(|(agent, _), _| !agents.contains(agent));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn take_more_than_held_fails_without_side_effects() {
        let mut table = InventoryTable::new();
        let agent = AgentId::new();
        table.add(agent, STONE_TOOL, 2);
        assert!(matches!(
            table.take(agent, STONE_TOOL, 3),
            Err(AgentError::InsufficientItem { available: 2, .. })
        ));
        assert_eq!(table.amount(agent, STONE_TOOL), 2);
    }

    #[test]
    fn empty_holdings_are_removed() {
        let mut table = InventoryTable::new();
        let agent = AgentId::new();
        table.add(agent, STONE_TOOL, 1);
        table.take(agent, STONE_TOOL, 1).unwrap();
        assert!(!table.has(agent, STONE_TOOL));
        assert!(table.is_empty());
    }
}
