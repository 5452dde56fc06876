//! A scheduler driver that talks to the cluster master over the message
//! transport.

use anyhow::Context;
use async_trait::async_trait;
use tracing::{debug, info};

use rpibridge_dispatch::{LaunchDirective, SchedulerDriver, TaskSpec};
use rpibridge_proto::{
    FrameworkId, FrameworkInfo, MasterMessage, OfferId, ProcessAddress, SlaveId, TaskId, TaskInfo,
    WireMessage,
};

use crate::outbox::Outbox;
use crate::transport::Transport;

/// Identity the driver presents to the master.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub master: ProcessAddress,
    pub framework_id: String,
    pub framework_name: String,
    pub user: String,
    /// Slave id used for tasks whose directive names none.
    pub default_slave_id: String,
}

/// [`SchedulerDriver`] that sends libprocess messages to the master.
pub struct LibprocessDriver<T> {
    outbox: Outbox<T>,
    master: ProcessAddress,
    framework: FrameworkInfo,
    framework_id: FrameworkId,
    default_slave_id: String,
}

impl<T: Transport> LibprocessDriver<T> {
    /// A driver sending from `sender`.
    pub fn new(sender: ProcessAddress, transport: T, config: DriverConfig) -> Self {
        let framework_id = FrameworkId::new(config.framework_id);
        Self {
            outbox: Outbox::new(sender, transport),
            master: config.master,
            framework: FrameworkInfo {
                user: config.user,
                name: config.framework_name,
                id: Some(framework_id.clone()),
                failover_timeout: None,
            },
            framework_id,
            default_slave_id: config.default_slave_id,
        }
    }

    pub fn transport(&self) -> &T {
        self.outbox.transport()
    }

    async fn send(&self, message: MasterMessage) -> anyhow::Result<()> {
        let message_type = message.message_type();
        self.outbox
            .deliver(&self.master, &message)
            .await
            .with_context(|| format!("delivering {message_type} to master {}", self.master))
    }

    fn task_info(&self, task: &TaskSpec) -> TaskInfo {
        TaskInfo {
            name: task.name.clone().unwrap_or_else(|| task.task_id.clone()),
            task_id: TaskId::new(task.task_id.as_str()),
            slave_id: SlaveId::new(
                task.slave_id
                    .clone()
                    .unwrap_or_else(|| self.default_slave_id.clone()),
            ),
            resources: task.resources.clone(),
            command: task.command.clone(),
            data: task.data.clone(),
        }
    }
}

#[async_trait]
impl<T: Transport> SchedulerDriver for LibprocessDriver<T> {
    async fn collect_resources(&mut self) -> anyhow::Result<()> {
        debug!(framework_id = %self.framework_id.value, "reviving offers");
        self.send(MasterMessage::revive_offers(&self.framework_id)).await
    }

    async fn launch_tasks(&mut self, directive: &LaunchDirective) -> anyhow::Result<()> {
        let tasks: Vec<TaskInfo> = directive.tasks.iter().map(|t| self.task_info(t)).collect();
        let offer_ids: Vec<OfferId> = directive
            .tasks
            .iter()
            .filter_map(|t| t.offer_id.as_deref().map(OfferId::new))
            .collect();
        debug!(
            framework_id = %self.framework_id.value,
            tasks = tasks.len(),
            offers = offer_ids.len(),
            "launching tasks"
        );
        self.send(MasterMessage::launch_tasks(&self.framework_id, tasks, offer_ids))
            .await
    }

    async fn kill_task(&mut self, task_id: &str) -> anyhow::Result<()> {
        debug!(framework_id = %self.framework_id.value, %task_id, "killing task");
        self.send(MasterMessage::kill_task(&self.framework_id, task_id))
            .await
    }

    async fn restart(&mut self) -> anyhow::Result<()> {
        info!(
            framework_id = %self.framework_id.value,
            master = %self.master,
            "re-registering framework with master"
        );
        self.send(MasterMessage::reregister_framework(self.framework.clone()))
            .await
    }
}
