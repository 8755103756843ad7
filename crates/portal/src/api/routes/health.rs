//! Liveness route

use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

/// Basic liveness check.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now(),
    }))
}
