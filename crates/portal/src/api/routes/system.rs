//! System status route

use axum::extract::State;
use axum::Json;
use tracing::error;

use crate::api::types::SystemStatusResponse;
use crate::api::{ApiError, ApiState};

/// When reconciliation last completed (null if it never ran).
pub async fn system_status(
    State(state): State<ApiState>,
) -> Result<Json<SystemStatusResponse>, ApiError> {
    match state.store.system_state().await {
        Ok(system_state) => Ok(Json(SystemStatusResponse {
            last_reconciliation: system_state.and_then(|s| s.last_reconciliation),
        })),
        Err(e) => {
            error!(error = %e, "Failed to read system state");
            Err(ApiError::Internal(
                "Failed to fetch system info".to_string(),
            ))
        }
    }
}
