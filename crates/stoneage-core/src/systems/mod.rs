//! The systems run by the default pipeline.
//!
//! # Modules
//!
//! - [`leadership`] -- chief election per faction
//! - [`biology`] -- food, vitals, healing and reproduction
//! - [`disease`] -- contagion state machine
//! - [`culture`] -- per-faction policy learning

pub mod biology;
pub mod culture;
pub mod disease;
pub mod leadership;

pub use biology::BiologySystem;
pub use culture::CultureSystem;
pub use disease::DiseaseSystem;
pub use leadership::LeadershipSystem;
