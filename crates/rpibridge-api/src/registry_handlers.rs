//! Provider registry routes.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::{error, info};

use rpibridge_registry::{RegistryError, RpiInfo};

use crate::ApiState;
use crate::response::{ApiResponse, error_response};

/// GET /rpis
pub async fn list_rpis(State(state): State<ApiState>) -> impl IntoResponse {
    match state.registry.list_rpis() {
        Ok(rpis) => ApiResponse::ok(rpis).into_response(),
        Err(e) => {
            error!(error = %e, "listing providers");
            error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response()
        }
    }
}

/// GET /rpis/{name}
pub async fn get_rpi(State(state): State<ApiState>, Path(name): Path<String>) -> impl IntoResponse {
    match state.registry.get_rpi(&name) {
        Ok(Some(rpi)) => ApiResponse::ok(rpi).into_response(),
        Ok(None) => error_response("provider not found", StatusCode::NOT_FOUND).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// POST /rpis
pub async fn add_rpi(State(state): State<ApiState>, Json(rpi): Json<RpiInfo>) -> impl IntoResponse {
    match state.registry.add_rpi(&rpi) {
        Ok(()) => {
            info!(name = %rpi.name, url = %rpi.url, "provider registered");
            (StatusCode::CREATED, ApiResponse::ok(rpi)).into_response()
        }
        Err(e @ RegistryError::Invalid(_)) => {
            error_response(&e.to_string(), StatusCode::BAD_REQUEST).into_response()
        }
        Err(e) => {
            error!(error = %e, name = %rpi.name, "registering provider");
            error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response()
        }
    }
}

/// DELETE /rpis/{name}
pub async fn delete_rpi(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match state.registry.delete_rpi(&name) {
        Ok(()) => {
            info!(%name, "provider removed");
            ApiResponse::ok("deleted").into_response()
        }
        Err(RegistryError::NotFound(_)) => {
            error_response("provider not found", StatusCode::NOT_FOUND).into_response()
        }
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}
