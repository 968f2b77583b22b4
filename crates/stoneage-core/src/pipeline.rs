//! The system pipeline contract.
//!
//! Every per-tick logic unit implements [`System`]. The [`Pipeline`] runs
//! them in registration order against the same [`WorldState`], so each
//! system observes the fully mutated output of every system before it in
//! the same tick. There is no isolation between systems within a tick.
//!
//! A system fails a tick either by returning a [`SystemError`] or by
//! panicking; both are converted into [`TickError::SystemFailed`] and the
//! remaining systems for that tick are skipped.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use stoneage_agents::AgentError;
use stoneage_types::ReportSnapshot;
use tracing::{debug, error};

use crate::simulation::TickError;
use crate::state::WorldState;

/// Errors a system returns to abort the current tick.
#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    /// A table operation failed in a way the system cannot skip.
    #[error("agent table error: {source}")]
    Agent {
        /// The underlying table error.
        #[from]
        source: AgentError,
    },

    /// The world state violates an invariant the system relies on.
    #[error("invariant violated: {reason}")]
    Invariant {
        /// What was found.
        reason: String,
    },
}

/// A per-tick logic unit operating on the shared world state.
pub trait System: Send + Any {
    /// Stable name used in logs and crash reports.
    fn name(&self) -> &'static str;

    /// Advance this system by one day. All mutation completes before
    /// returning.
    fn update(&mut self, state: &mut WorldState) -> Result<(), SystemError>;

    /// The world is about to be replaced by a fresh one. `ending` is the
    /// final state of the run being discarded.
    fn on_world_reset(&mut self, _ending: &WorldState) {}

    /// Persist any private state on demand.
    fn flush(&mut self) {}

    /// Add this system's figures to an end-of-run report.
    fn contribute_to_report(&self, _report: &mut ReportSnapshot) {}

    /// Downcasting hook for typed lookup through [`Pipeline::system_mut`].
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Ordered list of systems run once per tick.
#[derive(Default)]
pub struct Pipeline {
    systems: Vec<Box<dyn System>>,
}

impl core::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Pipeline").field("systems", &self.names()).finish()
    }
}

impl Pipeline {
    /// An empty pipeline.
    pub const fn new() -> Self {
        Self { systems: Vec::new() }
    }

    /// Append a system; it runs after every system already registered.
    pub fn register(&mut self, system: Box<dyn System>) {
        debug!(system = system.name(), position = self.systems.len(), "registered system");
        self.systems.push(system);
    }

    /// Builder form of [`Self::register`].
    #[must_use]
    pub fn with(mut self, system: impl System) -> Self {
        self.register(Box::new(system));
        self
    }

    /// Number of registered systems.
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Whether no systems are registered.
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// System names in execution order.
    pub fn names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|s| s.name()).collect()
    }

    /// First registered system of type `T`.
    pub fn system_mut<T: System>(&mut self) -> Option<&mut T> {
        self.systems
            .iter_mut()
            .find_map(|s| s.as_any_mut().downcast_mut::<T>())
    }

    /// Run every system once, in order. Stops at the first failure.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::SystemFailed`] naming the system that returned
    /// an error or panicked.
    pub fn run(&mut self, state: &mut WorldState) -> Result<(), TickError> {
        let day = state.day();
        for system in &mut self.systems {
            let name = system.name();
            let outcome = catch_unwind(AssertUnwindSafe(|| system.update(state)));
            let reason = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => err.to_string(),
                Err(payload) => panic_message(payload.as_ref()),
            };
            error!(day, system = name, %reason, "system failed, aborting tick");
            return Err(TickError::SystemFailed {
                system: name,
                day,
                reason,
            });
        }
        Ok(())
    }

    /// Notify every system that the world is being replaced.
    pub fn reset_all(&mut self, ending: &WorldState) {
        for system in &mut self.systems {
            system.on_world_reset(ending);
        }
    }

    /// Ask every system to persist its private state.
    pub fn flush_all(&mut self) {
        for system in &mut self.systems {
            system.flush();
        }
    }

    /// Let every system add its figures to a report.
    pub fn contribute_to_report(&self, report: &mut ReportSnapshot) {
        for system in &self.systems {
            system.contribute_to_report(report);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panicked: {msg}")
    } else {
        String::from("panicked")
    }
}
