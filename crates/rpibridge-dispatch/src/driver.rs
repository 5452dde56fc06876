//! The scheduler-driver seam and the directives routed to it.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use rpibridge_proto::{CommandInfo, Resource};

/// Operations the dispatcher performs against a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    CollectResources,
    LaunchTasks,
    KillTask,
    Restart,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::CollectResources => "collect resources",
            Operation::LaunchTasks => "launch tasks",
            Operation::KillTask => "kill task",
            Operation::Restart => "restart",
        };
        f.write_str(s)
    }
}

/// One task in a launch directive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub task_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slave_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_id: Option<String>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<CommandInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl TaskSpec {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            name: None,
            slave_id: None,
            offer_id: None,
            resources: Vec::new(),
            command: None,
            data: None,
        }
    }
}

/// Body of a `POST /launch_tasks` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchDirective {
    pub tasks: Vec<TaskSpec>,
}

impl LaunchDirective {
    /// Decode a directive from a JSON request body.
    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

/// A handle to the cluster scheduler driver.
///
/// Implementations need not be safe for concurrent use: the dispatcher
/// takes ownership and is the only caller. Methods take `&mut self` to
/// make that explicit.
#[async_trait]
pub trait SchedulerDriver: Send + 'static {
    /// Ask the cluster to send fresh offers.
    async fn collect_resources(&mut self) -> anyhow::Result<()>;

    async fn launch_tasks(&mut self, directive: &LaunchDirective) -> anyhow::Result<()>;

    async fn kill_task(&mut self, task_id: &str) -> anyhow::Result<()>;

    /// Tear down and re-establish the driver's connection to the cluster.
    async fn restart(&mut self) -> anyhow::Result<()>;
}

/// A type-erased driver.
pub type DynDriver = Box<dyn SchedulerDriver>;

#[async_trait]
impl<T: SchedulerDriver + ?Sized> SchedulerDriver for Box<T> {
    async fn collect_resources(&mut self) -> anyhow::Result<()> {
        (**self).collect_resources().await
    }

    async fn launch_tasks(&mut self, directive: &LaunchDirective) -> anyhow::Result<()> {
        (**self).launch_tasks(directive).await
    }

    async fn kill_task(&mut self, task_id: &str) -> anyhow::Result<()> {
        (**self).kill_task(task_id).await
    }

    async fn restart(&mut self) -> anyhow::Result<()> {
        (**self).restart().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_directive_decodes() {
        let directive = LaunchDirective::from_json(br#"{"tasks":[{"task_id":"t1"}]}"#).unwrap();
        assert_eq!(directive.tasks.len(), 1);
        assert_eq!(directive.tasks[0], TaskSpec::new("t1"));
    }

    #[test]
    fn full_task_spec_decodes() {
        let body = br#"{"tasks":[{
            "task_id":"t2",
            "name":"web",
            "slave_id":"slave-1",
            "offer_id":"offer-9",
            "resources":[{"name":"cpus","type":"SCALAR","scalar":{"value":0.5},"role":"*"}],
            "command":{"value":"./serve"}
        }]}"#;
        let directive = LaunchDirective::from_json(body).unwrap();
        let task = &directive.tasks[0];
        assert_eq!(task.offer_id.as_deref(), Some("offer-9"));
        assert_eq!(task.resources.len(), 1);
        assert!(task.command.as_ref().unwrap().shell);
    }

    #[test]
    fn undecodable_bodies_are_rejected() {
        assert!(LaunchDirective::from_json(b"not-json").is_err());
        assert!(LaunchDirective::from_json(b"{}").is_err());
        assert!(LaunchDirective::from_json(br#"{"tasks":[{}]}"#).is_err());
    }

    #[test]
    fn operation_display() {
        assert_eq!(Operation::CollectResources.to_string(), "collect resources");
        assert_eq!(Operation::Restart.to_string(), "restart");
    }
}
