//! Pillar snapshot and frontier ledger clients
//!
//! The reconciliation job consumes two external collaborators on the
//! primary network's public API, each behind its own trait so the job
//! can be exercised without the network:
//!
//! - [`PillarSource`]: the authoritative `{name, address, weight}`
//!   snapshot of all pillars.
//! - [`FrontierLookup`]: optional resolution of the public key behind an
//!   address from its frontier account block.
//!
//! [`ZenonHubClient`] implements both against a single base URL.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use common::error::NetworkError;

/// One pillar tuple from the authoritative snapshot.
///
/// `weight` is kept as the upstream decimal string; the chain unit
/// exceeds what an f64 holds losslessly, so parsing is left to the
/// consumer's numeric type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PillarSnapshot {
    pub name: String,
    pub owner_address: String,
    pub weight: String,
}

/// Source of the authoritative pillar snapshot.
#[async_trait]
pub trait PillarSource: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<PillarSnapshot>, NetworkError>;
}

/// Optional resolution of a public key from the ledger frontier.
#[async_trait]
pub trait FrontierLookup: Send + Sync {
    /// The hex-encoded public key behind `address`, when the ledger
    /// exposes one.
    async fn public_key_for(&self, address: &str) -> Result<Option<String>, NetworkError>;
}

#[derive(Deserialize)]
struct PillarsResponse {
    data: PillarsPage,
}

#[derive(Deserialize)]
struct PillarsPage {
    list: Vec<ApiPillar>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPillar {
    name: String,
    owner_address: String,
    weight: String,
}

#[derive(Deserialize)]
struct FrontierResponse {
    data: FrontierBlock,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FrontierBlock {
    #[serde(default)]
    public_key: Option<String>,
}

/// HTTP client for the primary network's public API.
pub struct ZenonHubClient {
    client: reqwest::Client,
    base_url: String,
}

impl ZenonHubClient {
    /// Create a new client with a bounded request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Self { client, base_url }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, NetworkError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| NetworkError::connection_failed(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::HttpError {
                status_code: status.as_u16(),
                message: format!("GET {url}"),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| NetworkError::invalid_response(e.to_string()))
    }
}

#[async_trait]
impl PillarSource for ZenonHubClient {
    async fn fetch_all(&self) -> Result<Vec<PillarSnapshot>, NetworkError> {
        let url = format!("{}/api/nom/pillars/get-all", self.base_url);
        let response: PillarsResponse = self.get_json(&url).await?;

        let snapshots = response
            .data
            .list
            .into_iter()
            .map(|pillar| PillarSnapshot {
                name: pillar.name,
                owner_address: pillar.owner_address,
                weight: pillar.weight,
            })
            .collect::<Vec<_>>();

        debug!(count = snapshots.len(), "Fetched pillar snapshot");
        Ok(snapshots)
    }
}

#[async_trait]
impl FrontierLookup for ZenonHubClient {
    async fn public_key_for(&self, address: &str) -> Result<Option<String>, NetworkError> {
        let url = format!(
            "{}/api/nom/ledger/get-frontier-account-block?address={address}",
            self.base_url
        );
        let response: FrontierResponse = self.get_json(&url).await?;

        // The ledger serves public keys base64-encoded; the portal
        // stores them as hex
        match response.data.public_key {
            Some(encoded) if !encoded.is_empty() => {
                let raw = BASE64
                    .decode(encoded.as_bytes())
                    .map_err(|e| NetworkError::invalid_response(e.to_string()))?;
                Ok(Some(hex::encode(raw)))
            }
            _ => Ok(None),
        }
    }
}
