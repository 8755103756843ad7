//! # Pillar Portal
//!
//! Registration portal for network pillars: proves that an external
//! actor controls a pillar's on-chain address before binding its
//! secondary-network parameters, and reconciles the authoritative
//! primary-network snapshot into local records without disturbing
//! proof-gated state.

pub mod api;
pub mod cli;
pub mod config;
pub mod persistence;
pub mod reconciliation;
pub mod registration;

// Main public API exports
pub use api::{ApiHandler, ApiState};
pub use cli::{Args, Cli, Command, CommandHandler};
pub use config::{PortalConfig, SignatureVerifier, SyncConfig, ZenonConfig};
pub use persistence::{Pillar, PillarStatus, PillarStore};
pub use reconciliation::{ReconciliationJob, ReconciliationOutcome};
pub use registration::{RegistrationData, RegistrationError, RegistrationWorkflow};

/// Re-export common error types
pub use common::error::{PersistenceError, PortalError};

/// Portal library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
