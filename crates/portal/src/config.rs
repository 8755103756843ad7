//! # Portal Configuration
//!
//! Layered configuration for the pillar portal, loaded through the
//! common figment-based loader (defaults, then `config.toml`, then
//! `PORTAL_*` environment overrides).

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use common::config::{loader, ConfigValidation, DatabaseConfig, LoggingConfig, ServerConfig};
use common::error::ConfigurationError;

/// Which signature authority implementation the workflow uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureVerifier {
    /// Delegate to the network's public verification endpoint
    Remote,
    /// Verify the ed25519 signature in process
    Local,
}

/// Primary-network endpoints consumed by the portal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZenonConfig {
    /// Base URL of the public chain API (pillar snapshot, ledger)
    pub api_base_url: String,

    /// Full URL of the signed-message verification endpoint
    pub verify_endpoint: String,

    /// Resolve missing public keys from the ledger frontier during
    /// reconciliation
    pub frontier_lookup: bool,

    /// Timeout applied to every outbound request
    pub request_timeout: Duration,
}

impl Default for ZenonConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://zenonhub.io".to_string(),
            verify_endpoint: "https://zenonhub.io/api/utilities/verify-signed-message".to_string(),
            frontier_lookup: false,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Signed-message configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureConfig {
    /// Fixed suffix appended to every canonical message
    pub message_suffix: String,

    /// Authority implementation
    pub verifier: SignatureVerifier,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            message_suffix: "HYPERQUBE LAUNCH".to_string(),
            verifier: SignatureVerifier::Remote,
        }
    }
}

/// Reconciliation trigger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Bearer secret guarding the sync trigger endpoint; the trigger is
    /// disabled when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    /// Minimum interval between reconciliation runs
    pub min_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            secret: None,
            min_interval: Duration::from_secs(3600),
        }
    }
}

/// Top-level portal configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Database configuration
    pub database: DatabaseConfig,

    /// HTTP server configuration
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Primary-network endpoints
    pub zenon: ZenonConfig,

    /// Canonical message and authority selection
    pub signature: SignatureConfig,

    /// Reconciliation trigger
    pub sync: SyncConfig,
}

impl ConfigValidation for PortalConfig {
    type Error = ConfigurationError;

    fn validate(&self) -> Result<(), Self::Error> {
        self.database.validate()?;
        self.server.validate()?;

        if self.zenon.api_base_url.is_empty() {
            return Err(ConfigurationError::invalid_value(
                "zenon.api_base_url",
                &self.zenon.api_base_url,
                "Base URL cannot be empty",
            ));
        }

        if self.zenon.verify_endpoint.is_empty() {
            return Err(ConfigurationError::invalid_value(
                "zenon.verify_endpoint",
                &self.zenon.verify_endpoint,
                "Verification endpoint cannot be empty",
            ));
        }

        if self.signature.message_suffix.is_empty() {
            return Err(ConfigurationError::invalid_value(
                "signature.message_suffix",
                &self.signature.message_suffix,
                "Message suffix cannot be empty",
            ));
        }

        if self.sync.min_interval.is_zero() {
            return Err(ConfigurationError::invalid_value(
                "sync.min_interval",
                "0",
                "Minimum sync interval must be greater than zero",
            ));
        }

        Ok(())
    }

    fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.sync.secret.is_none() {
            warnings.push(
                "No sync secret configured - the reconciliation trigger endpoint is disabled"
                    .to_string(),
            );
        }

        if self.signature.verifier == SignatureVerifier::Local {
            warnings.push(
                "Local signature verification enabled - proofs will not be cross-checked \
                 against the network authority"
                    .to_string(),
            );
        }

        warnings
    }
}

impl PortalConfig {
    /// Load configuration using the common loader with the `PORTAL_`
    /// environment prefix.
    pub fn load() -> Result<Self> {
        Ok(loader::load_config::<Self>()?)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &std::path::Path) -> Result<Self> {
        Ok(loader::load_from_file::<Self>(path)?)
    }
}
