//! The framework messaging bridge.
//!
//! `FrameworkManager` speaks to scheduler frameworks on behalf of the
//! bridge's master process: it acknowledges registrations, forwards task
//! status updates, makes synthetic offers and probes framework liveness.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;
use uuid::Uuid;

use rpibridge_proto::{FrameworkMessage, MasterState, ProcessAddress, ProtoError, TaskStatus};

use crate::error::{MessengerError, MessengerResult};
use crate::offer::OfferCapacity;
use crate::outbox::Outbox;
use crate::transport::{HyperTransport, Transport};

/// Sends protocol messages to frameworks.
#[derive(Debug, Clone)]
pub struct FrameworkManager<T = HyperTransport> {
    outbox: Outbox<T>,
    capacity: OfferCapacity,
}

impl<T: Transport> FrameworkManager<T> {
    /// A manager speaking as the master at `master`.
    pub fn new(master: ProcessAddress, transport: T) -> Self {
        Self {
            outbox: Outbox::new(master, transport),
            capacity: OfferCapacity::default(),
        }
    }

    /// Advertise `capacity` in synthetic offers.
    pub fn with_capacity(mut self, capacity: OfferCapacity) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn master(&self) -> &ProcessAddress {
        self.outbox.sender()
    }

    pub fn transport(&self) -> &T {
        self.outbox.transport()
    }

    /// Tell a framework its registration succeeded.
    pub async fn notify_registered(
        &self,
        framework_name: &str,
        framework_id: &str,
        framework: &ProcessAddress,
    ) -> MessengerResult<()> {
        if framework_name.is_empty() {
            return Err(MessengerError::Validation("framework must be named".to_string()));
        }

        let master_info = MasterState::new(self.master())
            .to_master_info()
            .await
            .map_err(|e| match e {
                ProtoError::Conversion(reason) => MessengerError::Conversion(reason),
                other => MessengerError::Conversion(other.to_string()),
            })?;

        debug!(%framework_id, %framework_name, %framework, "acknowledging framework registration");
        let message = FrameworkMessage::registered(framework_id, master_info);
        self.outbox.deliver(framework, &message).await
    }

    /// Forward a task status update to a framework.
    ///
    /// Every call mints a new update uuid, so repeated identical statuses
    /// are delivered as distinct updates.
    pub async fn send_status_update(
        &self,
        framework_id: &str,
        framework: &ProcessAddress,
        status: &TaskStatus,
    ) -> MessengerResult<()> {
        let uuid = Uuid::new_v4();
        debug!(
            %framework_id,
            task_id = %status.task_id.value,
            state = ?status.state,
            %uuid,
            "sending status update"
        );
        let message = FrameworkMessage::status_update(framework_id, status.clone(), epoch_secs(), uuid);
        self.outbox.deliver(framework, &message).await
    }

    /// Offer the provider's entire capacity to a framework as a single
    /// offer hosted on `slave`.
    pub async fn send_offer(
        &self,
        framework_id: &str,
        offer_id: &str,
        slave_id: &str,
        slave: &ProcessAddress,
        framework: &ProcessAddress,
    ) -> MessengerResult<()> {
        debug!(%framework_id, %offer_id, %slave_id, "sending task collection offer to framework");
        let offer = self.capacity.offer(framework_id, offer_id, slave_id, slave);
        let message = FrameworkMessage::resource_offer(offer, slave.pid());
        self.outbox.deliver(framework, &message).await
    }

    /// Probe whether a framework process is up.
    ///
    /// `Ok(false)` means nothing is listening (connection refused). Every
    /// other transport failure, including timeouts and name resolution
    /// errors, is returned as an error.
    pub async fn health_check(
        &self,
        framework_id: &str,
        framework: &ProcessAddress,
    ) -> MessengerResult<bool> {
        debug!(%framework_id, %framework, "checking health of framework");
        match self.outbox.probe(framework).await {
            Ok(status) => {
                debug!(%framework_id, %status, "framework answered health check");
                Ok(true)
            }
            Err(e) if e.is_connection_refused() => {
                debug!(%framework_id, "framework refused health check connection");
                Ok(false)
            }
            Err(source) => Err(MessengerError::Transport {
                context: format!("performing health check on framework {framework_id}"),
                source,
            }),
        }
    }
}

fn epoch_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as f64
}
