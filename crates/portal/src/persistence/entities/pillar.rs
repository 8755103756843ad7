//! Pillar entity and its registration lifecycle status

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registration lifecycle of a pillar.
///
/// Every pillar starts `Pending` when reconciliation first sees it. A
/// successful registration proof moves it to `Registered`; nothing moves
/// it back. Re-proving a `Registered` pillar is allowed and overwrites
/// the proof-gated fields idempotently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PillarStatus {
    Pending,
    Registered,
}

impl PillarStatus {
    /// Stable textual form used in storage and API payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Registered => "Registered",
        }
    }
}

impl std::fmt::Display for PillarStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PillarStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Registered" => Ok(Self::Registered),
            other => Err(format!("unknown pillar status {other:?}")),
        }
    }
}

/// A pillar record.
///
/// `name`, `address`, and `weight` are owned by reconciliation; the
/// public key, signature, and secondary-network fields are proof-gated
/// and only ever written by the registration workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pillar {
    /// Primary-network name, unique and immutable
    pub name: String,
    /// Primary-network owner address, unique and immutable
    pub address: String,
    /// Proven public key, 64 hex characters when present
    pub public_key: Option<String>,
    /// Signature that authorized the most recent proof-gated update
    pub signature: Option<String>,
    /// Chosen name on the secondary network
    pub secondary_name: Option<String>,
    pub secondary_owner_address: Option<String>,
    pub secondary_withdraw_address: Option<String>,
    pub secondary_producer_address: Option<String>,
    /// Optional Nostr identity key, format-validated only
    pub secondary_identity_key: Option<String>,
    pub status: PillarStatus,
    /// Delegated stake; exceeds what an f64 holds losslessly
    pub weight: u128,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set exactly when status first became `Registered`
    pub verified_at: Option<DateTime<Utc>>,
}

/// Singleton record tracking the last successful reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemState {
    pub last_reconciliation: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}
