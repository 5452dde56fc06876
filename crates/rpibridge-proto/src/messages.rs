//! Outbound protocol messages.
//!
//! Messages are grouped by destination into closed unions:
//! [`FrameworkMessage`] for scheduler frameworks and [`MasterMessage`]
//! for the cluster master. Each variant has exactly one constructor and
//! one fully-qualified type name, which becomes the last request path
//! segment on the wire.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ProtoResult;
use crate::types::*;

/// Anything that can be delivered over the message transport.
pub trait WireMessage {
    /// Fully-qualified message type name, e.g. `mesos.internal.StatusUpdateMessage`.
    fn message_type(&self) -> &'static str;

    /// JSON-encoded message body.
    fn to_body(&self) -> ProtoResult<Vec<u8>>;
}

// ── Framework-bound payloads ───────────────────────────────────────

/// Acknowledges a framework's registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameworkRegisteredMessage {
    pub framework_id: FrameworkId,
    pub master_info: MasterInfo,
}

/// One task status update with its delivery metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub framework_id: FrameworkId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executor_id: Option<ExecutorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slave_id: Option<SlaveId>,
    pub status: TaskStatus,
    /// Wall-clock seconds at which the update was stamped.
    pub timestamp: f64,
    pub uuid: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_state: Option<TaskState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdateMessage {
    pub update: StatusUpdate,
}

/// A batch of offers and the pids the framework may reach them at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceOffersMessage {
    pub offers: Vec<Offer>,
    pub pids: Vec<String>,
}

/// Messages sent to a scheduler framework.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FrameworkMessage {
    Registered(FrameworkRegisteredMessage),
    StatusUpdate(StatusUpdateMessage),
    ResourceOffers(ResourceOffersMessage),
}

impl FrameworkMessage {
    pub fn registered(framework_id: impl Into<String>, master_info: MasterInfo) -> Self {
        FrameworkMessage::Registered(FrameworkRegisteredMessage {
            framework_id: FrameworkId::new(framework_id),
            master_info,
        })
    }

    /// Wrap `status` in an update envelope.
    ///
    /// Executor and slave ids are lifted from `status` when present.
    /// `uuid` must be fresh per call; envelopes are never replayed.
    pub fn status_update(
        framework_id: impl Into<String>,
        status: TaskStatus,
        timestamp: f64,
        uuid: Uuid,
    ) -> Self {
        FrameworkMessage::StatusUpdate(StatusUpdateMessage {
            update: StatusUpdate {
                framework_id: FrameworkId::new(framework_id),
                executor_id: status.executor_id.clone(),
                slave_id: status.slave_id.clone(),
                latest_state: Some(status.state),
                status,
                timestamp,
                uuid,
            },
        })
    }

    /// A batch holding exactly one offer reachable at exactly one pid.
    pub fn resource_offer(offer: Offer, slave_pid: impl Into<String>) -> Self {
        FrameworkMessage::ResourceOffers(ResourceOffersMessage {
            offers: vec![offer],
            pids: vec![slave_pid.into()],
        })
    }
}

impl WireMessage for FrameworkMessage {
    fn message_type(&self) -> &'static str {
        match self {
            FrameworkMessage::Registered(_) => "mesos.internal.FrameworkRegisteredMessage",
            FrameworkMessage::StatusUpdate(_) => "mesos.internal.StatusUpdateMessage",
            FrameworkMessage::ResourceOffers(_) => "mesos.internal.ResourceOffersMessage",
        }
    }

    fn to_body(&self) -> ProtoResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

// ── Master-bound payloads ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviveOffersMessage {
    pub framework_id: FrameworkId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchTasksMessage {
    pub framework_id: FrameworkId,
    pub tasks: Vec<TaskInfo>,
    pub offer_ids: Vec<OfferId>,
    pub filters: Filters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KillTaskMessage {
    pub framework_id: FrameworkId,
    pub task_id: TaskId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReregisterFrameworkMessage {
    pub framework: FrameworkInfo,
    pub failover: bool,
}

/// Messages a scheduler driver sends to the cluster master.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MasterMessage {
    ReviveOffers(ReviveOffersMessage),
    LaunchTasks(LaunchTasksMessage),
    KillTask(KillTaskMessage),
    ReregisterFramework(ReregisterFrameworkMessage),
}

impl MasterMessage {
    pub fn revive_offers(framework_id: &FrameworkId) -> Self {
        MasterMessage::ReviveOffers(ReviveOffersMessage {
            framework_id: framework_id.clone(),
        })
    }

    /// Launch `tasks`, consuming the offers they reference.
    ///
    /// Offer ids are deduplicated in first-seen order.
    pub fn launch_tasks(framework_id: &FrameworkId, tasks: Vec<TaskInfo>, offer_ids: Vec<OfferId>) -> Self {
        let mut unique: Vec<OfferId> = Vec::with_capacity(offer_ids.len());
        for id in offer_ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        MasterMessage::LaunchTasks(LaunchTasksMessage {
            framework_id: framework_id.clone(),
            tasks,
            offer_ids: unique,
            filters: Filters::default(),
        })
    }

    pub fn kill_task(framework_id: &FrameworkId, task_id: impl Into<String>) -> Self {
        MasterMessage::KillTask(KillTaskMessage {
            framework_id: framework_id.clone(),
            task_id: TaskId::new(task_id),
        })
    }

    pub fn reregister_framework(framework: FrameworkInfo) -> Self {
        MasterMessage::ReregisterFramework(ReregisterFrameworkMessage {
            framework,
            failover: true,
        })
    }
}

impl WireMessage for MasterMessage {
    fn message_type(&self) -> &'static str {
        match self {
            MasterMessage::ReviveOffers(_) => "mesos.internal.ReviveOffersMessage",
            MasterMessage::LaunchTasks(_) => "mesos.internal.LaunchTasksMessage",
            MasterMessage::KillTask(_) => "mesos.internal.KillTaskMessage",
            MasterMessage::ReregisterFramework(_) => "mesos.internal.ReregisterFrameworkMessage",
        }
    }

    fn to_body(&self) -> ProtoResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}
