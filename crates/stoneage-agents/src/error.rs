//! Error types for the stoneage-agents crate.
//!
//! Table operations that can fail return typed errors rather than panicking.
//! Callers inside a tick treat most of these as transient: they log and skip
//! the affected agent instead of aborting the tick.

use stoneage_types::AgentId;

/// Errors that can occur during population and relation-table operations.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// Agent with the given ID is not in the population table.
    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),

    /// An agent with the same ID is already in the population table.
    #[error("duplicate agent id: {0}")]
    DuplicateAgent(AgentId),

    /// The operation requires a living agent.
    #[error("agent {agent_id} is dead")]
    AgentDead {
        /// The dead agent.
        agent_id: AgentId,
    },

    /// Attempted to take more of an item than the agent holds.
    #[error("insufficient {item}: wanted {requested} but agent {agent_id} holds {available}")]
    InsufficientItem {
        /// Holder.
        agent_id: AgentId,
        /// Item name.
        item: String,
        /// Quantity the caller attempted to take.
        requested: u32,
        /// Quantity actually held.
        available: u32,
    },
}
