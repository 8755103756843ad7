//! # Portal API Module
//!
//! HTTP/REST server exposing the pillar listing, the registration
//! workflow, the system status, and the guarded reconciliation trigger.

pub mod routes;
pub mod types;

use anyhow::Result;
use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::config::SyncConfig;
use crate::persistence::PillarStore;
use crate::reconciliation::ReconciliationJob;
use crate::registration::RegistrationWorkflow;

pub use types::ApiError;

/// API server state shared across handlers
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<PillarStore>,
    pub workflow: Arc<RegistrationWorkflow>,
    pub reconciliation: Arc<ReconciliationJob>,
    pub sync: SyncConfig,
}

/// Main API server implementation
pub struct ApiHandler {
    state: ApiState,
}

impl ApiHandler {
    /// Create a new API handler
    pub fn new(state: ApiState) -> Self {
        Self { state }
    }

    /// Start the API server
    pub async fn start(&self, bind_address: &str) -> Result<()> {
        let app = self.create_router();

        let listener = TcpListener::bind(bind_address).await?;
        info!("API server listening on {}", bind_address);

        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Create the Axum router with all endpoints
    fn create_router(&self) -> Router {
        Router::new()
            .route(
                "/pillars",
                get(routes::list_pillars).put(routes::register_pillar),
            )
            .route("/system", get(routes::system_status))
            .route("/sync", get(routes::trigger_sync))
            .route("/health", get(routes::health_check))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }
}
