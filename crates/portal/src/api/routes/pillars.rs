//! Pillar listing and registration routes

use axum::extract::State;
use axum::Json;
use tracing::{error, info};

use crate::api::types::{PillarResponse, RegisterPillarRequest, RegisterPillarResponse};
use crate::api::{ApiError, ApiState};
use crate::registration::RegistrationError;

/// List all pillars, heaviest first.
pub async fn list_pillars(
    State(state): State<ApiState>,
) -> Result<Json<Vec<PillarResponse>>, ApiError> {
    match state.store.list_by_weight_desc().await {
        Ok(pillars) => Ok(Json(pillars.into_iter().map(PillarResponse::from).collect())),
        Err(e) => {
            error!(error = %e, "Failed to list pillars");
            Err(ApiError::Internal("Failed to retrieve pillars".to_string()))
        }
    }
}

/// Run the registration workflow for one pillar.
pub async fn register_pillar(
    State(state): State<ApiState>,
    Json(request): Json<RegisterPillarRequest>,
) -> Result<Json<RegisterPillarResponse>, ApiError> {
    info!(pillar = %request.pillar_name, "Registration submitted");

    match state
        .workflow
        .register(&request.pillar_name, &request.data)
        .await
    {
        Ok(pillar_name) => Ok(Json(RegisterPillarResponse {
            message: "Pillar updated successfully".to_string(),
            pillar_name,
        })),
        Err(e) => {
            if let RegistrationError::Persistence(source) = &e {
                error!(pillar = %request.pillar_name, error = %source, "Registration persist failed");
            } else {
                info!(pillar = %request.pillar_name, reason = %e, "Registration rejected");
            }
            Err(e.into())
        }
    }
}
