//! API types and data transfer objects
//!
//! Request/response shapes for the portal HTTP API, plus the error type
//! handlers return. Weights serialize as decimal strings (the chain unit
//! exceeds a double's lossless range) and timestamps as ISO-8601.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::persistence::{Pillar, PillarStatus};
use crate::registration::{RegistrationData, RegistrationError};

/// Registration request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPillarRequest {
    pub pillar_name: String,
    pub data: RegistrationData,
}

/// Registration success response, echoing the pillar name
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPillarResponse {
    pub message: String,
    pub pillar_name: String,
}

/// One pillar in the listing response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PillarResponse {
    pub name: String,
    pub address: String,
    pub public_key: Option<String>,
    pub signature: Option<String>,
    pub secondary_name: Option<String>,
    pub secondary_owner_address: Option<String>,
    pub secondary_withdraw_address: Option<String>,
    pub secondary_producer_address: Option<String>,
    pub secondary_identity_key: Option<String>,
    pub status: PillarStatus,
    /// Decimal string; the value does not fit a JSON number losslessly
    pub weight: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
}

impl From<Pillar> for PillarResponse {
    fn from(pillar: Pillar) -> Self {
        Self {
            name: pillar.name,
            address: pillar.address,
            public_key: pillar.public_key,
            signature: pillar.signature,
            secondary_name: pillar.secondary_name,
            secondary_owner_address: pillar.secondary_owner_address,
            secondary_withdraw_address: pillar.secondary_withdraw_address,
            secondary_producer_address: pillar.secondary_producer_address,
            secondary_identity_key: pillar.secondary_identity_key,
            status: pillar.status,
            weight: pillar.weight.to_string(),
            created_at: pillar.created_at,
            updated_at: pillar.updated_at,
            verified_at: pillar.verified_at,
        }
    }
}

/// System status response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatusResponse {
    /// Completion time of the last reconciliation run, if any
    pub last_reconciliation: Option<DateTime<Utc>>,
}

/// Reconciliation trigger response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncTriggerResponse {
    pub success: bool,
    pub timestamp: DateTime<Utc>,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unauthorized,
    RateLimited { next_allowed_run: DateTime<Utc> },
    Internal(String),
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;
        use axum::Json;

        let (status, body) = match self {
            ApiError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                serde_json::json!({ "error": msg, "timestamp": Utc::now() }),
            ),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": msg, "timestamp": Utc::now() }),
            ),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                serde_json::json!({ "error": "Unauthorized", "timestamp": Utc::now() }),
            ),
            ApiError::RateLimited { next_allowed_run } => (
                StatusCode::TOO_MANY_REQUESTS,
                serde_json::json!({
                    "error": "Rate limited",
                    "nextAllowedRun": next_allowed_run,
                    "timestamp": Utc::now(),
                }),
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": msg, "timestamp": Utc::now() }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

impl From<RegistrationError> for ApiError {
    fn from(error: RegistrationError) -> Self {
        match &error {
            RegistrationError::Validation { .. } => Self::BadRequest(error.to_string()),
            RegistrationError::NotFound(_) => Self::NotFound("Pillar not found".to_string()),
            RegistrationError::OwnershipMismatch => {
                Self::BadRequest("Public key does not match the pillar's address".to_string())
            }
            RegistrationError::SignatureRejected => {
                Self::BadRequest("Invalid signature".to_string())
            }
            // Internal detail stays in the logs, not the response
            RegistrationError::Persistence(_) => {
                Self::Internal("Failed to update pillar data".to_string())
            }
        }
    }
}
