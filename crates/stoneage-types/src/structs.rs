//! Row types for the population table and its auxiliary relation tables.
//!
//! Every table is keyed by [`AgentId`] (and, for the disease tables, a
//! [`DiseaseId`]), so identities stay consistent with the population table.
//! Invariants that must hold for the whole run are enforced by keeping the
//! guarded field private: an agent's liveness can only go from `true` to
//! `false` once, immunity levels and policy sliders can only be written
//! through clamping setters.

use serde::{Deserialize, Serialize};

use crate::enums::{DeathCause, ImmunityKind, LogCategory, MatingNorm, RationingNorm, RelationshipKind, Role, Sex};
use crate::ids::{AgentId, DiseaseId, FactionId, FamilyId};

/// Version of the [`Agent`] row layout. Archived rows carry it so a reader
/// can migrate older rows explicitly.
pub const AGENT_SCHEMA_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Personality
// ---------------------------------------------------------------------------

/// Five continuous personality dimensions, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    /// Curiosity and adaptability.
    pub openness: f64,
    /// Diligence; raises foraging yield and leadership score.
    pub conscientiousness: f64,
    /// Sociability; burns extra stamina.
    pub extraversion: f64,
    /// Cooperativeness; chiefs high in it push rationing toward sharing.
    pub agreeableness: f64,
    /// Emotional volatility; paranoid chiefs make policy jitter.
    pub neuroticism: f64,
}

impl Personality {
    /// A personality with every dimension at `value`, clamped to `[0, 1]`.
    pub fn uniform(value: f64) -> Self {
        let v = value.clamp(0.0, 1.0);
        Self {
            openness: v,
            conscientiousness: v,
            extraversion: v,
            agreeableness: v,
            neuroticism: v,
        }
    }

    /// Clamp every dimension into `[0, 1]`.
    pub fn clamped(self) -> Self {
        Self {
            openness: self.openness.clamp(0.0, 1.0),
            conscientiousness: self.conscientiousness.clamp(0.0, 1.0),
            extraversion: self.extraversion.clamp(0.0, 1.0),
            agreeableness: self.agreeableness.clamp(0.0, 1.0),
            neuroticism: self.neuroticism.clamp(0.0, 1.0),
        }
    }
}

impl Default for Personality {
    fn default() -> Self {
        Self::uniform(0.5)
    }
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// One row of the population table.
///
/// Lineage references (`mother_id`, `father_id`, `conceived_with`) are weak:
/// the referenced agent may have died and been archived, so every lookup
/// through them must tolerate a miss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Row layout version ([`AGENT_SCHEMA_VERSION`] for rows built by this crate).
    pub schema_version: u32,
    /// Unique identity.
    pub id: AgentId,
    /// Faction the agent belongs to.
    pub faction_id: FactionId,
    /// Lineage identifier, inherited from the mother.
    pub family_id: FamilyId,
    /// Mother, if born in the simulation.
    pub mother_id: Option<AgentId>,
    /// Father, if known.
    pub father_id: Option<AgentId>,
    /// Age in years (continuous; one day adds 1/365).
    pub age: f64,
    /// Biological sex.
    pub sex: Sex,
    /// Social role.
    pub role: Role,
    /// Current hit points, in `[0, max_hp]`.
    pub hp: f64,
    /// Maximum hit points.
    pub max_hp: f64,
    /// Current stamina, in `[0, max_stamina]`.
    pub stamina: f64,
    /// Maximum stamina.
    pub max_stamina: f64,
    /// Whether the agent is carrying a child.
    pub pregnant: bool,
    /// Days since conception (0 when not pregnant).
    pub gestation_days: u32,
    /// Father of the unborn child.
    pub conceived_with: Option<AgentId>,
    /// Personality dimensions.
    pub personality: Personality,
    /// Susceptibility to disease damage, in `[0, 1]`.
    pub genetic_vulnerability: f64,
    /// Simulation day the agent was created on.
    pub born_on_day: u64,
    alive: bool,
    cause_of_death: Option<DeathCause>,
    died_on_day: Option<u64>,
}

impl Agent {
    /// Create a living adult-default row. Callers overwrite the public fields
    /// they care about (age, personality, lineage) before inserting it.
    pub fn new(faction_id: FactionId, sex: Sex, age: f64, born_on_day: u64) -> Self {
        Self {
            schema_version: AGENT_SCHEMA_VERSION,
            id: AgentId::new(),
            faction_id,
            family_id: FamilyId::new(),
            mother_id: None,
            father_id: None,
            age: age.max(0.0),
            sex,
            role: Role::Gatherer,
            hp: 100.0,
            max_hp: 100.0,
            stamina: 100.0,
            max_stamina: 100.0,
            pregnant: false,
            gestation_days: 0,
            conceived_with: None,
            personality: Personality::default(),
            genetic_vulnerability: 0.0,
            born_on_day,
            alive: true,
            cause_of_death: None,
            died_on_day: None,
        }
    }

    /// Whether the agent is alive.
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Cause of death, `None` while alive.
    pub const fn cause_of_death(&self) -> Option<DeathCause> {
        self.cause_of_death
    }

    /// Day of death, `None` while alive.
    pub const fn died_on_day(&self) -> Option<u64> {
        self.died_on_day
    }

    /// Flip liveness to false and record the cause.
    ///
    /// Returns `false` (and changes nothing) if the agent was already dead:
    /// liveness transitions exactly once.
    pub const fn mark_dead(&mut self, cause: DeathCause, day: u64) -> bool {
        if !self.alive {
            return false;
        }
        self.alive = false;
        self.cause_of_death = Some(cause);
        self.died_on_day = Some(day);
        self.pregnant = false;
        self.gestation_days = 0;
        self.conceived_with = None;
        true
    }

    /// Hit points as a fraction of the maximum.
    pub fn hp_fraction(&self) -> f64 {
        if self.max_hp > 0.0 {
            (self.hp / self.max_hp).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Add `delta` hit points, clamped to `[0, max_hp]`.
    pub fn change_hp(&mut self, delta: f64) {
        self.hp = (self.hp + delta).clamp(0.0, self.max_hp);
    }

    /// Add `delta` stamina, clamped to `[0, max_stamina]`.
    pub fn change_stamina(&mut self, delta: f64) {
        self.stamina = (self.stamina + delta).clamp(0.0, self.max_stamina);
    }

    /// Whether the agent is at least `min_age` years old.
    pub fn is_adult(&self, min_age: f64) -> bool {
        self.age >= min_age
    }
}

// ---------------------------------------------------------------------------
// Disease tables
// ---------------------------------------------------------------------------

/// Per-tick vitals damage applied to an active host before scaling.
///
/// Values are non-positive deltas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SeverityEffects {
    /// Hit points per day.
    pub hp: f64,
    /// Stamina per day.
    pub stamina: f64,
}

/// A procedurally generated pathogen. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseDefinition {
    /// Registry key.
    pub id: DiseaseId,
    /// Generated name, e.g. "Crimson Lung Rot".
    pub name: String,
    /// Per-carrier probability of infecting a susceptible agent per day.
    pub transmission: f64,
    /// Severity of the lethality roll for weakened hosts.
    pub lethality: f64,
    /// Days until an active infection resolves.
    pub duration: u32,
    /// Daily vitals damage.
    pub effects: SeverityEffects,
    /// Chronic infections go dormant instead of clearing.
    pub chronic: bool,
    /// Immunity model granted on recovery.
    pub immunity: ImmunityKind,
    /// Day the disease emerged.
    pub emerged_on_day: u64,
}

/// One (agent, disease) infection. At most one exists per pair.
///
/// `active == false` means chronic dormancy, not cure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfectionRecord {
    /// Host.
    pub agent_id: AgentId,
    /// Pathogen.
    pub disease_id: DiseaseId,
    /// Fraction of the disease duration elapsed in the current active phase.
    pub progress: f64,
    /// Days spent in the current active phase.
    pub days_infected: u32,
    /// Whether the infection is active (symptomatic and contagious).
    pub active: bool,
}

impl InfectionRecord {
    /// A freshly contracted, active infection.
    pub const fn new(agent_id: AgentId, disease_id: DiseaseId) -> Self {
        Self {
            agent_id,
            disease_id,
            progress: 0.0,
            days_infected: 0,
            active: true,
        }
    }
}

/// Immunity of one agent against one disease.
///
/// Created on first exposure with level 0; the level is kept in `[0, 1]` by
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImmunityRecord {
    /// Holder.
    pub agent_id: AgentId,
    /// Pathogen.
    pub disease_id: DiseaseId,
    /// Number of times the agent has contracted the disease.
    pub exposures: u32,
    level: f64,
}

impl ImmunityRecord {
    /// Record created on the first exposure.
    pub const fn first_exposure(agent_id: AgentId, disease_id: DiseaseId) -> Self {
        Self {
            agent_id,
            disease_id,
            exposures: 1,
            level: 0.0,
        }
    }

    /// Protection level in `[0, 1]`.
    pub const fn level(&self) -> f64 {
        self.level
    }

    /// Whether the protection is complete.
    pub fn is_full(&self) -> bool {
        self.level >= 1.0
    }

    /// Raise the level by `amount`, saturating at 1.
    pub fn raise(&mut self, amount: f64) {
        self.set_level(self.level + amount.max(0.0));
    }

    /// Lower the level by `amount`, saturating at 0.
    pub fn decay(&mut self, amount: f64) {
        self.set_level(self.level - amount.max(0.0));
    }

    /// Overwrite the level, clamped to `[0, 1]`. NaN is treated as 0.
    pub fn set_level(&mut self, level: f64) {
        self.level = if level.is_nan() { 0.0 } else { level.clamp(0.0, 1.0) };
    }
}

// ---------------------------------------------------------------------------
// Social and economic tables
// ---------------------------------------------------------------------------

/// One edge of the kinship/romance graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// First endpoint.
    pub a: AgentId,
    /// Second endpoint.
    pub b: AgentId,
    /// Edge kind, read as "`a` is `kind` of `b`".
    pub kind: RelationshipKind,
    /// Day the edge was created.
    pub start_day: u64,
}

/// Proficiency of one agent in one skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRecord {
    /// Holder.
    pub agent_id: AgentId,
    /// Skill name, e.g. `"foraging"`.
    pub skill: String,
    /// Proficiency in `[0, 1]`.
    pub level: f64,
}

/// Quantity of one item held by one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    /// Holder.
    pub agent_id: AgentId,
    /// Item name, e.g. `"stone_tool"`.
    pub item: String,
    /// Units held.
    pub amount: u32,
}

// ---------------------------------------------------------------------------
// Factions
// ---------------------------------------------------------------------------

/// Continuous policy sliders of a faction, mutated only by the culture
/// learner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactionPolicy {
    mating_strictness: f64,
    rationing_strictness: f64,
}

impl FactionPolicy {
    /// Build a policy from raw slider values, clamped to `[0, 1]`.
    pub fn new(mating_strictness: f64, rationing_strictness: f64) -> Self {
        let mut policy = Self {
            mating_strictness: 0.5,
            rationing_strictness: 0.5,
        };
        policy.set(mating_strictness, rationing_strictness);
        policy
    }

    /// Mating strictness: 0 is free union, 1 is eugenic screening.
    pub const fn mating_strictness(&self) -> f64 {
        self.mating_strictness
    }

    /// Rationing strictness: 0 is communal sharing, 1 is strongest-first.
    pub const fn rationing_strictness(&self) -> f64 {
        self.rationing_strictness
    }

    /// Overwrite both sliders, clamping each to `[0, 1]`.
    pub fn set(&mut self, mating: f64, rationing: f64) {
        self.mating_strictness = clamp_unit(mating);
        self.rationing_strictness = clamp_unit(rationing);
    }

    /// Shift both sliders by the given deltas, clamping each to `[0, 1]`.
    pub fn adjust(&mut self, mating_delta: f64, rationing_delta: f64) {
        self.set(
            self.mating_strictness + mating_delta,
            self.rationing_strictness + rationing_delta,
        );
    }

    /// Discrete mating label consumed by the biology system.
    pub fn mating_norm(&self) -> MatingNorm {
        if self.mating_strictness < 1.0 / 3.0 {
            MatingNorm::FreeUnion
        } else if self.mating_strictness < 2.0 / 3.0 {
            MatingNorm::Customary
        } else {
            MatingNorm::Eugenic
        }
    }

    /// Discrete rationing label consumed by the biology system.
    pub fn rationing_norm(&self) -> RationingNorm {
        if self.rationing_strictness < 1.0 / 3.0 {
            RationingNorm::Communal
        } else if self.rationing_strictness < 2.0 / 3.0 {
            RationingNorm::Balanced
        } else {
            RationingNorm::Meritocratic
        }
    }
}

impl Default for FactionPolicy {
    fn default() -> Self {
        Self::new(0.5, 0.5)
    }
}

/// Clamp into `[0, 1]`, mapping NaN to the neutral 0.5.
fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() { 0.5 } else { value.clamp(0.0, 1.0) }
}

/// Per-faction world state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactionState {
    /// Stable identifier.
    pub id: FactionId,
    /// Shared food store, in daily rations.
    pub food: f64,
    /// Policy sliders.
    pub policy: FactionPolicy,
    /// Current chief, if one has been elected.
    pub chief_id: Option<AgentId>,
}

impl FactionState {
    /// A faction with neutral policy and the given food store.
    pub fn new(id: FactionId, food: f64) -> Self {
        Self {
            id,
            food: food.max(0.0),
            policy: FactionPolicy::default(),
            chief_id: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Chronicle
// ---------------------------------------------------------------------------

/// One record of the bounded chronicle log sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Simulation day the entry was written on.
    pub day: u64,
    /// Human-readable message.
    pub message: String,
    /// Agent the entry is about, if any.
    pub agent_id: Option<AgentId>,
    /// Entry category.
    pub category: LogCategory,
}
