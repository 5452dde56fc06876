//! Framework messaging routes.
//!
//! Thin HTTP wrappers over [`FrameworkManager`](rpibridge_messenger::FrameworkManager):
//! each call sends one protocol message to the framework process named by
//! `pid` and reports whether the framework accepted it.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use tracing::error;

use rpibridge_messenger::MessengerError;
use rpibridge_proto::{ProcessAddress, TaskStatus};

use crate::ApiState;
use crate::response::{ApiResponse, error_response};

/// Body of `POST /frameworks/{framework_id}/registered`.
#[derive(Debug, Deserialize)]
pub struct RegisteredRequest {
    pub name: String,
    pub pid: ProcessAddress,
}

/// Body of `POST /frameworks/{framework_id}/status_update`.
#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub pid: ProcessAddress,
    pub status: TaskStatus,
}

/// Body of `POST /frameworks/{framework_id}/offers`.
#[derive(Debug, Deserialize)]
pub struct OfferRequest {
    pub pid: ProcessAddress,
    pub offer_id: String,
    pub slave_id: String,
    pub slave_pid: ProcessAddress,
}

#[derive(Debug, Deserialize)]
pub struct HealthQuery {
    pub pid: ProcessAddress,
}

fn delivered(framework_id: &str, result: Result<(), MessengerError>, what: &str) -> axum::response::Response {
    match result {
        Ok(()) => (StatusCode::ACCEPTED, ApiResponse::ok("delivered")).into_response(),
        Err(e) => {
            error!(%framework_id, error = %e, "sending {what}");
            error_response(&e.to_string(), e.status()).into_response()
        }
    }
}

/// POST /frameworks/{framework_id}/registered
pub async fn notify_registered(
    State(state): State<ApiState>,
    Path(framework_id): Path<String>,
    Json(req): Json<RegisteredRequest>,
) -> impl IntoResponse {
    let result = state
        .frameworks
        .notify_registered(&req.name, &framework_id, &req.pid)
        .await;
    delivered(&framework_id, result, "registration acknowledgement")
}

/// POST /frameworks/{framework_id}/status_update
pub async fn send_status_update(
    State(state): State<ApiState>,
    Path(framework_id): Path<String>,
    Json(req): Json<StatusUpdateRequest>,
) -> impl IntoResponse {
    let result = state
        .frameworks
        .send_status_update(&framework_id, &req.pid, &req.status)
        .await;
    delivered(&framework_id, result, "status update")
}

/// POST /frameworks/{framework_id}/offers
pub async fn send_offer(
    State(state): State<ApiState>,
    Path(framework_id): Path<String>,
    Json(req): Json<OfferRequest>,
) -> impl IntoResponse {
    let result = state
        .frameworks
        .send_offer(&framework_id, &req.offer_id, &req.slave_id, &req.slave_pid, &req.pid)
        .await;
    delivered(&framework_id, result, "offer")
}

/// GET /frameworks/{framework_id}/health?pid=...
pub async fn health_check(
    State(state): State<ApiState>,
    Path(framework_id): Path<String>,
    Query(query): Query<HealthQuery>,
) -> impl IntoResponse {
    match state.frameworks.health_check(&framework_id, &query.pid).await {
        Ok(healthy) => ApiResponse::ok(serde_json::json!({
            "framework_id": framework_id,
            "healthy": healthy,
        }))
        .into_response(),
        Err(e) => {
            error!(%framework_id, error = %e, "health check failed");
            error_response(&e.to_string(), e.status()).into_response()
        }
    }
}
