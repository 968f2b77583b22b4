//! The population table: one row per agent, living or not yet archived.
//!
//! Rows live in a dense arena (`Vec<Agent>`) with an id index on the side,
//! so systems can sweep every row without per-row lookups and still resolve
//! weak references (parents, partners) in logarithmic time. Rows are only
//! removed by [`PopulationTable::remove_dead`], which the archiver calls
//! after it has persisted them; systems mark agents dead and leave the row in
//! place.

use std::collections::BTreeMap;

use stoneage_types::{Agent, AgentId, DeathCause, FactionId};

use crate::error::AgentError;

/// Arena of agent rows with an id index and run-level counters.
#[derive(Debug, Clone, Default)]
pub struct PopulationTable {
    rows: Vec<Agent>,
    index: BTreeMap<AgentId, usize>,
    total_spawned: u64,
    archived: u64,
    archived_deaths: BTreeMap<DeathCause, u64>,
}

impl PopulationTable {
    /// An empty table.
    pub const fn new() -> Self {
        Self {
            rows: Vec::new(),
            index: BTreeMap::new(),
            total_spawned: 0,
            archived: 0,
            archived_deaths: BTreeMap::new(),
        }
    }

    /// Insert a new row.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::DuplicateAgent`] if the id is already present.
    pub fn insert(&mut self, agent: Agent) -> Result<AgentId, AgentError> {
        let id = agent.id;
        if self.index.contains_key(&id) {
            tracing::warn!(agent_id = %id, "rejected duplicate agent row");
            return Err(AgentError::DuplicateAgent(id));
        }
        self.index.insert(id, self.rows.len());
        self.rows.push(agent);
        self.total_spawned = self.total_spawned.saturating_add(1);
        Ok(id)
    }

    /// Number of rows, living and dead.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows at all.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of living agents.
    pub fn living_count(&self) -> usize {
        self.rows.iter().filter(|a| a.is_alive()).count()
    }

    /// Number of dead rows awaiting archival.
    pub fn dead_count(&self) -> usize {
        self.rows.iter().filter(|a| !a.is_alive()).count()
    }

    /// Look up a row by id.
    pub fn get(&self, id: &AgentId) -> Option<&Agent> {
        self.index.get(id).and_then(|idx| self.rows.get(*idx))
    }

    /// Look up a row by id for mutation.
    pub fn get_mut(&mut self, id: &AgentId) -> Option<&mut Agent> {
        let idx = *self.index.get(id)?;
        self.rows.get_mut(idx)
    }

    /// Look up a living agent; dead rows resolve to `None`.
    pub fn get_living(&self, id: &AgentId) -> Option<&Agent> {
        self.get(id).filter(|a| a.is_alive())
    }

    /// Whether `id` refers to a living agent.
    pub fn is_alive(&self, id: &AgentId) -> bool {
        self.get_living(id).is_some()
    }

    /// Every row in arena order.
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.rows.iter()
    }

    /// Living rows in arena order.
    pub fn living(&self) -> impl Iterator<Item = &Agent> {
        self.rows.iter().filter(|a| a.is_alive())
    }

    /// Living rows in arena order, for bulk mutation.
    pub fn living_mut(&mut self) -> impl Iterator<Item = &mut Agent> {
        self.rows.iter_mut().filter(|a| a.is_alive())
    }

    /// Living members of one faction.
    pub fn faction_members<'a>(&'a self, faction: &'a FactionId) -> impl Iterator<Item = &'a Agent> + 'a {
        self.living().filter(move |a| &a.faction_id == faction)
    }

    /// Ids of living agents matching `predicate`, in arena order.
    pub fn living_ids_where<F>(&self, mut predicate: F) -> Vec<AgentId>
    where
        F: FnMut(&Agent) -> bool,
    {
        self.living().filter(|a| predicate(a)).map(|a| a.id).collect()
    }

    /// Ids of every living agent, in arena order.
    pub fn living_ids(&self) -> Vec<AgentId> {
        self.living_ids_where(|_| true)
    }

    /// Mark an agent dead.
    ///
    /// Returns `Ok(false)` if the agent was already dead.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::AgentNotFound`] if the id is unknown.
    pub fn kill(&mut self, id: &AgentId, cause: DeathCause, day: u64) -> Result<bool, AgentError> {
        let Some(agent) = self.get_mut(id) else {
            tracing::warn!(agent_id = %id, %cause, day, "kill requested for unknown agent");
            return Err(AgentError::AgentNotFound(*id));
        };
        Ok(agent.mark_dead(cause, day))
    }

    /// Dead rows awaiting archival, in arena order.
    pub fn dead(&self) -> impl Iterator<Item = &Agent> {
        self.rows.iter().filter(|a| !a.is_alive())
    }

    /// Remove every dead row and return them, updating the run counters.
    ///
    /// Idempotent: a table without dead rows is left untouched.
    pub fn remove_dead(&mut self) -> Vec<Agent> {
        if self.rows.iter().all(Agent::is_alive) {
            return Vec::new();
        }
        let (dead, living): (Vec<Agent>, Vec<Agent>) = std::mem::take(&mut self.rows)
            .into_iter()
            .partition(|a| !a.is_alive());
        self.rows = living;
        self.reindex();
        for agent in &dead {
            if let Some(cause) = agent.cause_of_death() {
                let count = self.archived_deaths.entry(cause).or_insert(0);
                *count = count.saturating_add(1);
            }
        }
        self.archived = self.archived.saturating_add(u64::try_from(dead.len()).unwrap_or(u64::MAX));
        tracing::debug!(removed = dead.len(), remaining = self.rows.len(), "dead rows removed");
        dead
    }

    /// Agents created over the life of this table.
    pub const fn total_spawned(&self) -> u64 {
        self.total_spawned
    }

    /// Dead rows already removed by [`Self::remove_dead`].
    pub const fn archived_count(&self) -> u64 {
        self.archived
    }

    /// Deaths by cause over the life of this table, archived or not.
    pub fn deaths_by_cause(&self) -> BTreeMap<DeathCause, u64> {
        let mut histogram = self.archived_deaths.clone();
        for cause in self.dead().filter_map(Agent::cause_of_death) {
            let count = histogram.entry(cause).or_insert(0);
            *count = count.saturating_add(1);
        }
        histogram
    }

    fn reindex(&mut self) {
        self.index = self.rows.iter().enumerate().map(|(idx, a)| (a.id, idx)).collect();
    }
}
