//! The serialized action dispatcher.
//!
//! [`Dispatcher::spawn`] moves a driver into a dedicated worker task.
//! Callers hand the worker closures over `&mut D`; the worker runs them
//! one at a time, in the order they were admitted, and answers each
//! caller on its own oneshot channel.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::action::{Action, ActionResult, BoxFuture, Completion};
use crate::error::DispatchError;

/// Dispatcher tuning.
#[derive(Debug, Clone, Default)]
pub struct DispatchConfig {
    /// How long a caller waits for its action. `None` waits forever.
    pub submit_timeout: Option<Duration>,
}

struct Job<D> {
    action: Action<D>,
    reply: oneshot::Sender<ActionResult>,
}

/// Cloneable handle for submitting actions to the worker.
pub struct Dispatcher<D> {
    tx: mpsc::UnboundedSender<Job<D>>,
    submit_timeout: Option<Duration>,
}

impl<D> Clone for Dispatcher<D> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            submit_timeout: self.submit_timeout,
        }
    }
}

impl<D: Send + 'static> Dispatcher<D> {
    /// Start the worker. It owns `driver` until every handle is dropped
    /// and the queue is drained, then hands the driver back through the
    /// join handle.
    pub fn spawn(driver: D, config: DispatchConfig) -> (Self, JoinHandle<D>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_worker(driver, rx));
        debug!(submit_timeout = ?config.submit_timeout, "dispatcher started");
        (
            Self {
                tx,
                submit_timeout: config.submit_timeout,
            },
            handle,
        )
    }

    /// Admit `action` to the queue without waiting for it.
    ///
    /// Admission order is the order of `enqueue` calls. Once admitted an
    /// action always runs, even if its [`Ticket`] is dropped.
    pub fn enqueue<F>(&self, action: F) -> Result<Ticket, DispatchError>
    where
        F: for<'a> FnOnce(&'a mut D) -> BoxFuture<'a, ActionResult> + Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        let job = Job {
            action: Box::new(action),
            reply,
        };
        self.tx.send(job).map_err(|_| DispatchError::Closed)?;
        Ok(Ticket {
            rx,
            timeout: self.submit_timeout,
        })
    }

    /// Admit `action` and wait for its outcome.
    pub async fn submit<F>(&self, action: F) -> Result<Completion, DispatchError>
    where
        F: for<'a> FnOnce(&'a mut D) -> BoxFuture<'a, ActionResult> + Send + 'static,
    {
        self.enqueue(action)?.wait().await
    }

    /// Whether the worker has stopped accepting actions.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// A caller's private completion slot for one admitted action.
#[must_use = "an admitted action runs regardless; drop the ticket only to discard its result"]
pub struct Ticket {
    rx: oneshot::Receiver<ActionResult>,
    timeout: Option<Duration>,
}

impl Ticket {
    /// Drop the caller deadline; [`wait`](Self::wait) then blocks until
    /// the action finishes or the worker stops.
    pub fn untimed(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Wait for the action's outcome.
    pub async fn wait(self) -> Result<Completion, DispatchError> {
        let outcome = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.rx)
                .await
                .map_err(|_| DispatchError::TimedOut(limit))?,
            None => self.rx.await,
        };
        match outcome {
            Ok(result) => result.map_err(DispatchError::from),
            Err(_) => Err(DispatchError::Closed),
        }
    }
}

async fn run_worker<D>(mut driver: D, mut rx: mpsc::UnboundedReceiver<Job<D>>) -> D {
    let mut executed: u64 = 0;
    while let Some(job) = rx.recv().await {
        let result = (job.action)(&mut driver).await;
        executed += 1;
        trace!(executed, ok = result.is_ok(), "action finished");
        if job.reply.send(result).is_err() {
            debug!("caller stopped waiting; action result dropped");
        }
    }
    debug!(executed, "dispatcher queue closed");
    driver
}
