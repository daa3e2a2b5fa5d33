use axum::{Json, extract::State};
use serde_json::json;

use ar_common::api::HealthResponse;

use crate::SharedState;
use crate::error::ApiError;

pub async fn livez() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Ready while not shutting down and the catalog is non-empty.
pub async fn readyz(State(state): State<SharedState>) -> Result<Json<HealthResponse>, ApiError> {
    if !state.readiness.load(std::sync::atomic::Ordering::SeqCst) {
        return Err(ApiError::NotReady("shutting_down"));
    }
    if state.catalog_size == 0 {
        return Err(ApiError::NotReady("empty_catalog"));
    }

    Ok(Json(HealthResponse {
        status: "healthy",
        assessments_loaded: state.catalog_size,
    }))
}

pub async fn index() -> Json<serde_json::Value> {
    Json(json!({
        "application": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "recommend": "/recommend",
            "health": "/health",
            "livez": "/livez",
            "readyz": "/readyz",
        },
    }))
}
