//! Type-safe identifier wrappers.
//!
//! Agents, families and diseases are identified by UUID v7 (time-ordered)
//! newtypes so the compiler rejects mixing them. Factions are different:
//! their identity has to survive a full world reset and a process restart
//! (the per-faction Q-tables are keyed by it), so a [`FactionId`] is a stable
//! configured name rather than a generated UUID.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }

            /// Last eight hex digits, used in human-readable log lines.
            pub fn short(&self) -> String {
                let simple = self.0.simple().to_string();
                let start = simple.len().saturating_sub(8);
                simple.get(start..).unwrap_or_default().to_owned()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for an agent (one row of the population table).
    AgentId
}

define_id! {
    /// Identifier shared by every member of a lineage.
    FamilyId
}

define_id! {
    /// Identifier of a procedurally generated disease definition.
    DiseaseId
}

/// Stable identifier of a faction (sub-population with its own policy and
/// learning agent), e.g. `"red_tribe"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactionId(String);

impl FactionId {
    /// Create a faction identifier from its configured name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human-readable name: `"red_tribe"` becomes `"Red Tribe"`.
    pub fn display_name(&self) -> String {
        self.0
            .split(['_', '-'])
            .filter(|part| !part.is_empty())
            .map(|part| {
                let mut chars = part.chars();
                chars.next().map_or_else(String::new, |first| {
                    first.to_uppercase().chain(chars).collect::<String>()
                })
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl core::fmt::Display for FactionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FactionId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
