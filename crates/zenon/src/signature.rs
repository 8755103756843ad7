//! Signature verification boundary
//!
//! Registration proofs are signatures over a canonical message. The
//! portal itself never decides whether a signature is valid: that is the
//! `SignatureAuthority` capability, with two implementations behind the
//! same seam so the workflow stays agnostic to which is configured:
//!
//! - [`RemoteSignatureAuthority`] delegates to the network's public
//!   verification endpoint over HTTP.
//! - [`LocalSignatureAuthority`] verifies the ed25519 signature in
//!   process.
//!
//! Callers must treat a rejection and a transport failure identically as
//! "proof not accepted".

use async_trait::async_trait;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use common::error::NetworkError;

use crate::address::{self, PUBLIC_KEY_LENGTH};

/// Length of a detached ed25519 signature in bytes
const SIGNATURE_LENGTH: usize = 64;

/// Build the canonical message a pillar owner signs to authorize a
/// registration update.
///
/// The primary pillar name, the four secondary-network fields, the
/// secondary identity key when present, and the configured suffix,
/// joined by single spaces with no trailing characters. The external
/// authority verifies against exactly this string; any deviation
/// rejects a legitimate signature.
pub fn canonical_message(
    pillar_name: &str,
    secondary_name: &str,
    owner_address: &str,
    withdraw_address: &str,
    producer_address: &str,
    identity_key: Option<&str>,
    suffix: &str,
) -> String {
    let mut parts = vec![
        pillar_name,
        secondary_name,
        owner_address,
        withdraw_address,
        producer_address,
    ];
    if let Some(key) = identity_key {
        parts.push(key);
    }
    parts.push(suffix);
    parts.join(" ")
}

/// One signature check: everything the authority needs to decide.
#[derive(Debug, Clone)]
pub struct SignatureCheck {
    /// The canonical message that was signed
    pub message: String,
    /// Detached signature, 128 hex characters
    pub signature: String,
    /// Signer's public key, 64 hex characters
    pub public_key: String,
    /// The address the signer claims to own
    pub address: String,
}

/// Capability for verifying a signed registration message.
#[async_trait]
pub trait SignatureAuthority: Send + Sync {
    /// Whether the authority accepts the proof.
    ///
    /// `Ok(false)` is a rejection; `Err` is a failure to reach a
    /// verdict. Callers treat both as "not accepted".
    async fn verify(&self, check: &SignatureCheck) -> Result<bool, NetworkError>;
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    public_key: &'a str,
    message: &'a str,
    signature: &'a str,
    address: &'a str,
}

#[derive(Deserialize)]
struct VerifyResponse {
    #[serde(default)]
    data: serde_json::Value,
}

/// Authority that delegates to the network's verification endpoint.
pub struct RemoteSignatureAuthority {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl RemoteSignatureAuthority {
    /// Create a new remote authority with a bounded request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        }
    }
}

#[async_trait]
impl SignatureAuthority for RemoteSignatureAuthority {
    async fn verify(&self, check: &SignatureCheck) -> Result<bool, NetworkError> {
        let request = VerifyRequest {
            public_key: &check.public_key,
            message: &check.message,
            signature: &check.signature,
            address: &check.address,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NetworkError::Timeout {
                        timeout_secs: self.timeout.as_secs(),
                    }
                } else {
                    NetworkError::connection_failed(self.endpoint.clone(), e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                status = status.as_u16(),
                address = %check.address,
                "Verification endpoint returned non-success status"
            );
            return Ok(false);
        }

        let body: VerifyResponse = response
            .json()
            .await
            .map_err(|e| NetworkError::invalid_response(e.to_string()))?;

        // The endpoint signals acceptance through a truthy `data` field
        let accepted = match body.data {
            serde_json::Value::Null => false,
            serde_json::Value::Bool(b) => b,
            _ => true,
        };

        debug!(address = %check.address, accepted, "Remote signature verification completed");
        Ok(accepted)
    }
}

/// Authority that verifies the ed25519 signature in process.
///
/// Also requires the claimed public key to derive to the claimed
/// address, matching what the remote endpoint enforces.
#[derive(Default)]
pub struct LocalSignatureAuthority;

impl LocalSignatureAuthority {
    fn accepts(&self, check: &SignatureCheck) -> bool {
        let Ok(key_bytes) = hex::decode(&check.public_key) else {
            return false;
        };
        let Ok(key) = <[u8; PUBLIC_KEY_LENGTH]>::try_from(key_bytes.as_slice()) else {
            return false;
        };
        let Ok(verifying_key) = VerifyingKey::from_bytes(&key) else {
            return false;
        };

        if !address::verify_public_key(&check.address, &key) {
            return false;
        }

        let Ok(signature_bytes) = hex::decode(&check.signature) else {
            return false;
        };
        let Ok(signature) = <[u8; SIGNATURE_LENGTH]>::try_from(signature_bytes.as_slice()) else {
            return false;
        };
        let signature = Signature::from_bytes(&signature);

        verifying_key
            .verify(check.message.as_bytes(), &signature)
            .is_ok()
    }
}

#[async_trait]
impl SignatureAuthority for LocalSignatureAuthority {
    async fn verify(&self, check: &SignatureCheck) -> Result<bool, NetworkError> {
        Ok(self.accepts(check))
    }
}
