//! Queued actions and their outcomes.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use http::StatusCode;

use crate::error::ActionError;

/// A boxed, `Send` future borrowing for `'a`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a queued action produces.
pub type ActionResult = Result<Completion, ActionError>;

/// Successful outcome of an action: a payload and the status to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub payload: Bytes,
    pub status: StatusCode,
}

impl Completion {
    /// A directive was accepted: `202 Accepted`, no body.
    pub fn accepted() -> Self {
        Self {
            payload: Bytes::new(),
            status: StatusCode::ACCEPTED,
        }
    }

    pub fn with_payload(status: StatusCode, payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            status,
        }
    }
}

/// A unit of work executed against `&mut D` by the dispatcher worker.
pub(crate) type Action<D> =
    Box<dyn for<'a> FnOnce(&'a mut D) -> BoxFuture<'a, ActionResult> + Send>;
