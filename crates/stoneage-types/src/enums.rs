//! Enumeration types for the Stone Age simulation kernel.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Demographics
// ---------------------------------------------------------------------------

/// Biological sex of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sex {
    /// Male.
    Male,
    /// Female.
    Female,
}

impl Sex {
    /// The other sex.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Male => Self::Female,
            Self::Female => Self::Male,
        }
    }
}

/// Social role of an agent within its faction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Not yet old enough to work.
    Child,
    /// Forages for the faction food store.
    Gatherer,
    /// Hunts; forages with a higher but more seasonal yield.
    Hunter,
    /// Tends the sick; does not forage.
    Healer,
    /// Elected leader of the faction.
    Chief,
}

impl Role {
    /// Whether this role contributes to the faction's food store.
    pub const fn forages(self) -> bool {
        matches!(self, Self::Gatherer | Self::Hunter)
    }
}

/// Why an agent died. Recorded once, when liveness flips to false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DeathCause {
    /// Hit points reached zero while fed.
    HealthFailure,
    /// Hit points reached zero while starving.
    Starvation,
    /// Natural death past the old-age onset.
    OldAge,
    /// Killed by an active infection.
    Disease,
    /// Died giving birth.
    Childbirth,
}

impl core::fmt::Display for DeathCause {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::HealthFailure => write!(f, "health_failure"),
            Self::Starvation => write!(f, "starvation"),
            Self::OldAge => write!(f, "old_age"),
            Self::Disease => write!(f, "disease"),
            Self::Childbirth => write!(f, "childbirth"),
        }
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A season of the 365-day year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Season {
    /// Days 0-89 of the year.
    Spring,
    /// Days 90-179 of the year.
    Summer,
    /// Days 180-269 of the year.
    Autumn,
    /// Days 270-364 of the year.
    Winter,
}

impl core::fmt::Display for Season {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Spring => write!(f, "Spring"),
            Self::Summer => write!(f, "Summer"),
            Self::Autumn => write!(f, "Autumn"),
            Self::Winter => write!(f, "Winter"),
        }
    }
}

// ---------------------------------------------------------------------------
// Disease
// ---------------------------------------------------------------------------

/// How recovering from a disease protects against it afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ImmunityKind {
    /// Permanent full protection after recovery.
    Sterilizing,
    /// Protection that decays over time.
    Waning,
    /// Partial protection, but every re-exposure worsens the damage taken.
    Sensitizing,
}

// ---------------------------------------------------------------------------
// Relationships
// ---------------------------------------------------------------------------

/// Kind of edge in the kinship/romance graph.
///
/// Edges are directed: `Parent` means `a` is the parent of `b`, `Child` the
/// reverse. `Spouse` edges are stored once per pair with `a < b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RelationshipKind {
    /// Bonded pair.
    Spouse,
    /// `a` is a parent of `b`.
    Parent,
    /// `a` is a child of `b`.
    Child,
}

// ---------------------------------------------------------------------------
// Faction policy labels
// ---------------------------------------------------------------------------

/// Discrete label derived from the mating-strictness slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MatingNorm {
    /// Strictness below 1/3: anyone may pair.
    FreeUnion,
    /// Strictness between 1/3 and 2/3.
    Customary,
    /// Strictness of 2/3 or more: partners screened for genetic health.
    Eugenic,
}

/// Discrete label derived from the rationing-strictness slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RationingNorm {
    /// Strictness below 1/3: food shared in random order.
    Communal,
    /// Strictness between 1/3 and 2/3.
    Balanced,
    /// Strictness of 2/3 or more: the strongest eat first.
    Meritocratic,
}

impl core::fmt::Display for MatingNorm {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::FreeUnion => "free_union",
            Self::Customary => "customary",
            Self::Eugenic => "eugenic",
        })
    }
}

impl core::fmt::Display for RationingNorm {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Communal => "communal",
            Self::Balanced => "balanced",
            Self::Meritocratic => "meritocratic",
        })
    }
}

// ---------------------------------------------------------------------------
// Culture observation bands
// ---------------------------------------------------------------------------

/// Discretised faction headcount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PopulationBand {
    /// Below the low limit.
    Critical,
    /// Between the low and healthy limits.
    Low,
    /// At or above the healthy limit.
    Healthy,
}

/// Discretised average genetic vulnerability of a faction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GeneticBand {
    /// Low average vulnerability.
    Pure,
    /// Moderate average vulnerability.
    Mixed,
    /// High average vulnerability.
    Degenerated,
}

/// Discretised food stock per living member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceBand {
    /// Almost nothing to eat.
    Famine,
    /// Some reserves.
    Scarce,
    /// Plenty.
    Abundant,
}

impl core::fmt::Display for PopulationBand {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Critical => "CRITICAL",
            Self::Low => "LOW",
            Self::Healthy => "HEALTHY",
        })
    }
}

impl core::fmt::Display for GeneticBand {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Pure => "PURE",
            Self::Mixed => "MIXED",
            Self::Degenerated => "DEGENERATED",
        })
    }
}

impl core::fmt::Display for ResourceBand {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Famine => "FAMINE",
            Self::Scarce => "SCARCE",
            Self::Abundant => "ABUNDANT",
        })
    }
}

// ---------------------------------------------------------------------------
// Chronicle
// ---------------------------------------------------------------------------

/// Category of a chronicle entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LogCategory {
    /// A new disease emerged.
    Outbreak,
    /// Infection state changes (reactivation, recovery).
    Disease,
    /// One or more agents died.
    Death,
    /// A child was born or a pair bonded.
    Birth,
    /// A faction changed its policy.
    Policy,
    /// A chief was elected or fell.
    Leadership,
    /// Population fell below the low-water mark.
    Extinction,
    /// Engine lifecycle: start, halt, reset.
    Engine,
    /// Persistence outcomes worth surfacing to the driver.
    Persistence,
}

impl core::fmt::Display for LogCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            Self::Outbreak => "outbreak",
            Self::Disease => "disease",
            Self::Death => "death",
            Self::Birth => "birth",
            Self::Policy => "policy",
            Self::Leadership => "leadership",
            Self::Extinction => "extinction",
            Self::Engine => "engine",
            Self::Persistence => "persistence",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_foraging_roles_forage() {
        assert!(Role::Gatherer.forages());
        assert!(Role::Hunter.forages());
        assert!(!Role::Healer.forages());
        assert!(!Role::Chief.forages());
        assert!(!Role::Child.forages());
    }

    #[test]
    fn death_cause_display_is_snake_case() {
        assert_eq!(DeathCause::OldAge.to_string(), "old_age");
        assert_eq!(DeathCause::HealthFailure.to_string(), "health_failure");
    }

    #[test]
    fn opposite_sex() {
        assert_eq!(Sex::Male.opposite(), Sex::Female);
        assert_eq!(Sex::Female.opposite(), Sex::Male);
    }
}
