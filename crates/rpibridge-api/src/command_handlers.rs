//! Command bridges: HTTP directives turned into serialized driver calls.
//!
//! Each handler admits one action to the dispatcher and waits for its
//! slot. A failed action is answered with the dispatcher's status code,
//! logged, and escalated to the driver supervisor unless it only ran
//! past the caller deadline.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{debug, error, warn};

use rpibridge_dispatch::{
    ActionError, ActionResult, BoxFuture, Completion, DispatchError, DriverFault, DynDriver,
    LaunchDirective, Operation,
};

use crate::ApiState;

/// POST /collect_resources
pub async fn collect_resources(State(state): State<ApiState>) -> Response {
    dispatch(&state, Operation::CollectResources, |driver| {
        Box::pin(async move {
            driver
                .collect_resources()
                .await
                .map_err(|e| ActionError::driver(Operation::CollectResources, e))?;
            Ok(Completion::accepted())
        })
    })
    .await
}

/// POST /launch_tasks
///
/// The body is decoded before anything is queued, so a malformed
/// directive never reaches the driver and is not escalated.
pub async fn launch_tasks(State(state): State<ApiState>, body: Bytes) -> Response {
    let directive = match LaunchDirective::from_json(&body) {
        Ok(directive) => directive,
        Err(e) => {
            warn!(
                error = %e,
                request_sent_by = %state.request_sent_by,
                "rejecting undecodable launch tasks directive"
            );
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    dispatch(&state, Operation::LaunchTasks, move |driver| {
        Box::pin(async move {
            driver
                .launch_tasks(&directive)
                .await
                .map_err(|e| ActionError::driver(Operation::LaunchTasks, e))?;
            Ok(Completion::accepted())
        })
    })
    .await
}

/// POST /kill_task/{task_id}
pub async fn kill_task(State(state): State<ApiState>, Path(task_id): Path<String>) -> Response {
    dispatch(&state, Operation::KillTask, move |driver| {
        Box::pin(async move {
            driver
                .kill_task(&task_id)
                .await
                .map_err(|e| ActionError::driver(Operation::KillTask, e))?;
            Ok(Completion::accepted())
        })
    })
    .await
}

async fn dispatch<F>(state: &ApiState, operation: Operation, action: F) -> Response
where
    F: for<'a> FnOnce(&'a mut DynDriver) -> BoxFuture<'a, ActionResult> + Send + 'static,
{
    match state.dispatcher.submit(action).await {
        Ok(completion) => {
            debug!(%operation, status = %completion.status, "directive completed");
            (completion.status, completion.payload).into_response()
        }
        Err(err) => fail(state, operation, err),
    }
}

fn fail(state: &ApiState, operation: Operation, err: DispatchError) -> Response {
    let status = err.status();
    error!(
        %operation,
        error = %err,
        status = status.as_u16(),
        request_sent_by = %state.request_sent_by,
        "processing directive"
    );
    // A timed-out action is still queued or running; only settled
    // failures reach the supervisor.
    if !matches!(err, DispatchError::TimedOut(_)) {
        state.faults.escalate(DriverFault::new(operation, &err));
    }
    status.into_response()
}
