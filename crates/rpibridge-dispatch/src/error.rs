//! Dispatcher error types.

use std::time::Duration;

use http::StatusCode;
use thiserror::Error;

use crate::driver::Operation;

/// Failure classified by the action itself.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The directive could not be decoded or failed validation before any
    /// driver call was made.
    #[error("invalid directive: {0}")]
    Validation(String),

    /// The driver rejected or failed the operation.
    #[error("driver failed to {operation}: {source:#}")]
    Driver {
        operation: Operation,
        #[source]
        source: anyhow::Error,
    },
}

impl ActionError {
    pub fn driver(operation: Operation, source: anyhow::Error) -> Self {
        ActionError::Driver { operation, source }
    }

    /// HTTP status reported for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            ActionError::Validation(_) => StatusCode::BAD_REQUEST,
            ActionError::Driver { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Errors returned from [`Dispatcher::submit`](crate::Dispatcher::submit).
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Action(#[from] ActionError),

    /// The worker has stopped; the action was not admitted or its result
    /// was lost.
    #[error("dispatcher is closed")]
    Closed,

    /// The caller stopped waiting. The action itself still runs.
    #[error("action did not complete within {0:?}")]
    TimedOut(Duration),
}

impl DispatchError {
    /// HTTP status reported to the caller for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::Action(e) => e.status(),
            DispatchError::Closed => StatusCode::SERVICE_UNAVAILABLE,
            DispatchError::TimedOut(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

/// Errors that end the supervisor loop.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("driver restart failed after {faults} fault(s): {source}")]
    RestartFailed {
        faults: u64,
        #[source]
        source: DispatchError,
    },
}
