//! Persistence layer for pillar records and system state

pub mod entities;
pub mod pillar_store;

pub use entities::{Pillar, PillarStatus, SystemState};
pub use pillar_store::{PillarStore, RegistrationUpdate, UpsertOutcome};
