//! Kinship and romance graph.
//!
//! Edges reference agents weakly: an endpoint may already be dead (and, after
//! the next archival pass, gone from the population table). Lookups return
//! ids only; callers resolve them against the population table and tolerate
//! a miss.

use std::collections::BTreeSet;

use stoneage_types::{AgentId, Relationship, RelationshipKind};

/// Edge list of the relationship graph.
#[derive(Debug, Clone, Default)]
pub struct RelationshipTable {
    edges: Vec<Relationship>,
}

impl RelationshipTable {
    /// An empty graph.
    pub const fn new() -> Self {
        Self { edges: Vec::new() }
    }

    /// Bond two agents as spouses. Returns `false` if either already has a
    /// spouse or the pair is degenerate.
    pub fn bond(&mut self, a: AgentId, b: AgentId, day: u64) -> bool {
        if a == b || self.spouse_of(a).is_some() || self.spouse_of(b).is_some() {
            return false;
        }
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        self.edges.push(Relationship {
            a: first,
            b: second,
            kind: RelationshipKind::Spouse,
            start_day: day,
        });
        true
    }

    /// Record a birth: `parent` is a Parent of `child` and `child` a Child of
    /// `parent`.
    pub fn add_parent(&mut self, parent: AgentId, child: AgentId, day: u64) {
        self.edges.push(Relationship {
            a: parent,
            b: child,
            kind: RelationshipKind::Parent,
            start_day: day,
        });
        self.edges.push(Relationship {
            a: child,
            b: parent,
            kind: RelationshipKind::Child,
            start_day: day,
        });
    }

    /// Current spouse of `agent`, if any.
    pub fn spouse_of(&self, agent: AgentId) -> Option<AgentId> {
        self.edges.iter().find_map(|e| match e.kind {
            RelationshipKind::Spouse if e.a == agent => Some(e.b),
            RelationshipKind::Spouse if e.b == agent => Some(e.a),
            _ => None,
        })
    }

    /// Children of `agent`.
    pub fn children_of(&self, agent: AgentId) -> Vec<AgentId> {
        self.edges
            .iter()
            .filter(|e| e.kind == RelationshipKind::Parent && e.a == agent)
            .map(|e| e.b)
            .collect()
    }

    /// Parents of `agent` still present in the graph.
    pub fn parents_of(&self, agent: AgentId) -> Vec<AgentId> {
        self.edges
            .iter()
            .filter(|e| e.kind == RelationshipKind::Child && e.a == agent)
            .map(|e| e.b)
            .collect()
    }

    /// Whether `a` and `b` are parent and child or share a parent.
    pub fn are_close_kin(&self, a: AgentId, b: AgentId) -> bool {
        let parents_a = self.parents_of(a);
        if parents_a.contains(&b) || self.parents_of(b).contains(&a) {
            return true;
        }
        self.parents_of(b).iter().any(|p| parents_a.contains(p))
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether the graph has no edges.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Every edge.
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.edges.iter()
    }

    /// Drop every edge touching one of the given agents. A surviving spouse
    /// becomes single.
    pub fn purge(&mut self, agents: &BTreeSet<AgentId>) {
        self.edges.retain(|e| !agents.contains(&e.a) && !agents.contains(&e.b));
    }
}
