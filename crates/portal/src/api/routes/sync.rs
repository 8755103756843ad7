//! Reconciliation trigger route
//!
//! Invoked by an external scheduler. The trigger itself only enforces
//! the contract the scheduler cannot: a bearer secret and the minimum
//! interval between runs, tracked through the persisted system state.

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::Json;
use chrono::Utc;
use tracing::{error, warn};

use zenon::secure_compare;

use crate::api::types::SyncTriggerResponse;
use crate::api::{ApiError, ApiState};

/// Run a reconciliation pass, unless one ran too recently.
pub async fn trigger_sync(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Json<SyncTriggerResponse>, ApiError> {
    let Some(secret) = &state.sync.secret else {
        warn!("Sync trigger invoked but no secret is configured");
        return Err(ApiError::Unauthorized);
    };

    let expected = format!("Bearer {secret}");
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| secure_compare(value.as_bytes(), expected.as_bytes()))
        .unwrap_or(false);
    if !authorized {
        warn!("Sync trigger rejected: bad or missing authorization");
        return Err(ApiError::Unauthorized);
    }

    let min_interval = chrono::Duration::from_std(state.sync.min_interval)
        .unwrap_or_else(|_| chrono::Duration::hours(1));
    let last_run = state
        .store
        .system_state()
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to read system state");
            ApiError::Internal("Failed to read system state".to_string())
        })?
        .and_then(|s| s.last_reconciliation);

    if let Some(last) = last_run {
        let next_allowed_run = last + min_interval;
        if Utc::now() < next_allowed_run {
            return Err(ApiError::RateLimited { next_allowed_run });
        }
    }

    let outcome = state.reconciliation.run().await.map_err(|e| {
        error!(error = %e, "Reconciliation run failed");
        ApiError::Internal("Reconciliation failed".to_string())
    })?;

    Ok(Json(SyncTriggerResponse {
        success: true,
        timestamp: Utc::now(),
        created: outcome.created,
        updated: outcome.updated,
        skipped: outcome.skipped,
    }))
}
