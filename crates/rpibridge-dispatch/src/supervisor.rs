//! Driver supervision.
//!
//! A failed directive may mean the driver's view of the cluster has
//! drifted from the cluster's own. Command handlers report such failures
//! as [`DriverFault`] events through a [`FaultReporter`]; the single
//! [`DriverSupervisor`] consumes them and restarts the driver through the
//! dispatcher, so a restart never overlaps a directive.
//!
//! Ownership: the daemon creates the pair with [`channel`], hands
//! reporters to the HTTP layer and runs the supervisor as a background
//! task. If the supervisor has exited, [`FaultReporter::escalate`]
//! returns `false` and the fault is only logged.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::action::{BoxFuture, Completion};
use crate::driver::{Operation, SchedulerDriver};
use crate::error::{ActionError, DispatchError, SupervisorError};
use crate::queue::Dispatcher;

/// An escalated dispatcher failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverFault {
    pub operation: Operation,
    /// HTTP status the failing request was answered with.
    pub status: u16,
    pub message: String,
    /// Unix timestamp (seconds).
    pub occurred_at: u64,
}

impl DriverFault {
    pub fn new(operation: Operation, err: &DispatchError) -> Self {
        Self {
            operation,
            status: err.status().as_u16(),
            message: err.to_string(),
            occurred_at: epoch_secs(),
        }
    }
}

/// Sending half of the fault channel. Cheap to clone; never blocks.
#[derive(Debug, Clone)]
pub struct FaultReporter {
    tx: mpsc::UnboundedSender<DriverFault>,
}

impl FaultReporter {
    /// Hand `fault` to the supervisor. Returns `false` if no supervisor
    /// is listening.
    pub fn escalate(&self, fault: DriverFault) -> bool {
        let operation = fault.operation;
        match self.tx.send(fault) {
            Ok(()) => {
                debug!(%operation, "driver fault escalated");
                true
            }
            Err(mpsc::error::SendError(fault)) => {
                warn!(
                    %operation,
                    error = %fault.message,
                    "driver supervisor is not running; fault dropped"
                );
                false
            }
        }
    }
}

/// Summary returned when the supervisor stops cleanly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SupervisorReport {
    pub faults: u64,
    pub restarts: u64,
}

/// Receiving half of the fault channel.
pub struct DriverSupervisor {
    rx: mpsc::UnboundedReceiver<DriverFault>,
}

/// Create a connected reporter/supervisor pair.
pub fn channel() -> (FaultReporter, DriverSupervisor) {
    let (tx, rx) = mpsc::unbounded_channel();
    (FaultReporter { tx }, DriverSupervisor { rx })
}

impl DriverSupervisor {
    /// Consume faults until `shutdown` fires or every reporter is gone.
    ///
    /// Each fault (plus any that queued up behind it) triggers one driver
    /// restart, submitted through `dispatcher`. A failed restart ends the
    /// loop with an error.
    pub async fn run<D: SchedulerDriver>(
        mut self,
        dispatcher: Dispatcher<D>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<SupervisorReport, SupervisorError> {
        let mut report = SupervisorReport::default();
        info!("driver supervisor started");

        loop {
            let fault = tokio::select! {
                fault = self.rx.recv() => match fault {
                    Some(fault) => fault,
                    None => {
                        debug!("all fault reporters dropped");
                        break;
                    }
                },
                _ = shutdown.changed() => {
                    debug!("driver supervisor shutting down");
                    break;
                }
            };

            report.faults += 1;
            warn!(
                operation = %fault.operation,
                status = fault.status,
                error = %fault.message,
                "driver fault received"
            );

            // Faults that piled up while the previous restart ran are
            // covered by the restart below.
            while let Ok(extra) = self.rx.try_recv() {
                report.faults += 1;
                debug!(operation = %extra.operation, "coalescing queued driver fault");
            }

            // Restarts are awaited without the caller deadline.
            let restarted = match dispatcher.enqueue(restart_action::<D>) {
                Ok(ticket) => ticket.untimed().wait().await,
                Err(e) => Err(e),
            };
            match restarted {
                Ok(_) => {
                    report.restarts += 1;
                    info!(restarts = report.restarts, "scheduler driver restarted");
                }
                Err(DispatchError::Closed) => {
                    debug!("dispatcher closed; supervisor exiting");
                    break;
                }
                Err(source) => {
                    error!(error = %source, "scheduler driver restart failed");
                    return Err(SupervisorError::RestartFailed {
                        faults: report.faults,
                        source,
                    });
                }
            }
        }

        info!(faults = report.faults, restarts = report.restarts, "driver supervisor stopped");
        Ok(report)
    }
}

fn restart_action<D: SchedulerDriver>(
    driver: &mut D,
) -> BoxFuture<'_, Result<Completion, ActionError>> {
    Box::pin(async move {
        driver
            .restart()
            .await
            .map_err(|e| ActionError::driver(Operation::Restart, e))?;
        Ok(Completion::accepted())
    })
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
