//! Bounded, queryable log sink for simulation events.
//!
//! The chronicle keeps the most recent entries in memory for the driver to
//! display; the oldest entry is evicted once capacity is reached. Every
//! entry is mirrored to `tracing` so it also reaches the process log.

use std::collections::VecDeque;

use stoneage_types::{AgentId, LogCategory, LogEntry};
use tracing::info;

/// Default number of entries kept.
pub const DEFAULT_CHRONICLE_CAPACITY: usize = 1000;

/// Ring buffer of [`LogEntry`] records, newest last internally.
#[derive(Debug, Clone)]
pub struct Chronicle {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl Default for Chronicle {
    fn default() -> Self {
        Self::new(DEFAULT_CHRONICLE_CAPACITY)
    }
}

impl Chronicle {
    /// An empty chronicle holding at most `capacity` entries (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(DEFAULT_CHRONICLE_CAPACITY)),
            capacity,
        }
    }

    /// Append an entry, evicting the oldest one when full.
    pub fn record(&mut self, day: u64, category: LogCategory, message: impl Into<String>, agent_id: Option<AgentId>) {
        let message = message.into();
        info!(day, %category, agent_id = ?agent_id, "{message}");
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(LogEntry {
            day,
            message,
            agent_id,
            category,
        });
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the chronicle is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries held.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries, newest first.
    pub fn newest_first(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().rev()
    }

    /// Up to `n` of the newest entries, newest first.
    pub fn recent(&self, n: usize) -> Vec<&LogEntry> {
        self.newest_first().take(n).collect()
    }

    /// Entries about one agent, newest first.
    pub fn for_agent(&self, agent: AgentId) -> Vec<&LogEntry> {
        self.newest_first().filter(|e| e.agent_id == Some(agent)).collect()
    }

    /// Entries of one category, newest first.
    pub fn by_category(&self, category: LogCategory) -> Vec<&LogEntry> {
        self.newest_first().filter(|e| e.category == category).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oldest_entries_are_evicted() {
        let mut chronicle = Chronicle::new(3);
        for day in 1..=5 {
            chronicle.record(day, LogCategory::Engine, format!("day {day}"), None);
        }
        assert_eq!(chronicle.len(), 3);
        let days: Vec<u64> = chronicle.newest_first().map(|e| e.day).collect();
        assert_eq!(days, vec![5, 4, 3]);
    }

    #[test]
    fn query_by_agent_and_category() {
        let mut chronicle = Chronicle::new(10);
        let agent = AgentId::new();
        chronicle.record(1, LogCategory::Outbreak, "outbreak", Some(agent));
        chronicle.record(2, LogCategory::Death, "someone else", Some(AgentId::new()));
        chronicle.record(3, LogCategory::Disease, "recovered", Some(agent));
        let entries = chronicle.for_agent(agent);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries.first().map(|e| e.day), Some(3));
        assert_eq!(chronicle.by_category(LogCategory::Death).len(), 1);
        assert_eq!(chronicle.recent(1).len(), 1);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut chronicle = Chronicle::new(0);
        chronicle.record(1, LogCategory::Engine, "a", None);
        chronicle.record(2, LogCategory::Engine, "b", None);
        assert_eq!(chronicle.len(), 1);
        assert_eq!(chronicle.capacity(), 1);
    }
}
