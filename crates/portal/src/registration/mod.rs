//! Registration workflow
//!
//! The single mutation path for a pillar's proof-gated fields:
//! structural validation, then proof that the caller controls the
//! pillar's address, then one persist step. Fail-fast with no partial
//! writes.

pub mod validation;
pub mod workflow;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use common::error::PersistenceError;

pub use workflow::RegistrationWorkflow;

/// The data bundle submitted with a registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationData {
    /// Owner's public key, 64 hex characters
    pub public_key: String,
    /// Chosen name on the secondary network
    pub secondary_name: String,
    pub secondary_owner_address: String,
    pub secondary_withdraw_address: String,
    pub secondary_producer_address: String,
    /// Optional Nostr identity key (npub format)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_identity_key: Option<String>,
    /// Signature over the canonical message, 128 hex characters
    pub signature: String,
}

/// Failures of a registration attempt, in workflow order.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// A field failed structural validation; nothing else ran
    #[error("Invalid {field}: {reason}")]
    Validation {
        field: &'static str,
        reason: String,
    },

    /// No pillar with the submitted name exists
    #[error("Pillar not found: {0}")]
    NotFound(String),

    /// The submitted public key does not derive to the pillar's address
    #[error("Public key does not match the pillar's address")]
    OwnershipMismatch,

    /// The signature authority rejected the proof or was unreachable
    #[error("Signature verification failed")]
    SignatureRejected,

    /// The store failed to persist an otherwise valid registration
    #[error("Failed to persist registration: {0}")]
    Persistence(#[from] PersistenceError),
}

impl RegistrationError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }
}
