//! Cluster protocol data types.
//!
//! These mirror the subset of the cluster scheduler's message schema the
//! bridge produces. Field names follow the protocol's snake_case JSON
//! encoding; optional fields are omitted when absent.

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name {
            pub value: String,
        }

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self { value: value.into() }
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }
    };
}

id_type!(
    /// Identifies a registered framework.
    FrameworkId
);
id_type!(
    /// Identifies a compute node (slave).
    SlaveId
);
id_type!(
    /// Identifies a resource offer.
    OfferId
);
id_type!(
    /// Identifies a task.
    TaskId
);
id_type!(
    /// Identifies an executor.
    ExecutorId
);

// ── Task status ────────────────────────────────────────────────────

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    TaskStaging,
    TaskStarting,
    TaskRunning,
    TaskKilling,
    TaskFinished,
    TaskFailed,
    TaskKilled,
    TaskLost,
    TaskError,
}

impl TaskState {
    /// Whether no further transitions can follow this state.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::TaskFinished
                | TaskState::TaskFailed
                | TaskState::TaskKilled
                | TaskState::TaskLost
                | TaskState::TaskError
        )
    }
}

/// Status of a task as reported to its framework.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub task_id: TaskId,
    pub state: TaskState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slave_id: Option<SlaveId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executor_id: Option<ExecutorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthy: Option<bool>,
}

impl TaskStatus {
    /// A status with only the required fields set.
    pub fn new(task_id: impl Into<String>, state: TaskState) -> Self {
        Self {
            task_id: TaskId::new(task_id),
            state,
            message: None,
            source: None,
            reason: None,
            data: None,
            slave_id: None,
            executor_id: None,
            timestamp: None,
            healthy: None,
        }
    }
}

// ── Resources ──────────────────────────────────────────────────────

/// Kind of value a resource carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueType {
    Scalar,
    Ranges,
}

/// A scalar resource quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scalar {
    pub value: f64,
}

/// An inclusive `[begin, end]` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub begin: u64,
    pub end: u64,
}

/// A set of ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ranges {
    pub range: Vec<Range>,
}

/// One named resource (`cpus`, `mem`, `disk`, `ports`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scalar: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranges: Option<Ranges>,
    pub role: String,
}

impl Resource {
    /// A scalar resource in the default role.
    pub fn scalar(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            kind: ValueType::Scalar,
            scalar: Some(Scalar { value }),
            ranges: None,
            role: "*".to_string(),
        }
    }

    /// A ranges resource in the default role.
    pub fn ranges(name: impl Into<String>, ranges: Vec<Range>) -> Self {
        Self {
            name: name.into(),
            kind: ValueType::Ranges,
            scalar: None,
            ranges: Some(Ranges { range: ranges }),
            role: "*".to_string(),
        }
    }
}

// ── Offers ─────────────────────────────────────────────────────────

/// A resource offer made to a framework.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub framework_id: FrameworkId,
    pub slave_id: SlaveId,
    pub hostname: String,
    pub resources: Vec<Resource>,
}

/// Offer filters attached to a launch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refuse_seconds: Option<f64>,
}

// ── Master / framework info ────────────────────────────────────────

/// Description of the current leading master, sent on registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterInfo {
    pub id: String,
    /// IPv4 address packed into a host-order integer.
    pub ip: u32,
    pub port: u32,
    pub pid: String,
    pub hostname: String,
    pub version: String,
}

/// Framework description sent by a scheduler driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameworkInfo {
    pub user: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FrameworkId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failover_timeout: Option<f64>,
}

// ── Tasks ──────────────────────────────────────────────────────────

/// Command a task runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandInfo {
    pub value: String,
    #[serde(default = "default_shell")]
    pub shell: bool,
}

fn default_shell() -> bool {
    true
}

/// A task description handed to the master for launch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInfo {
    pub name: String,
    pub task_id: TaskId,
    pub slave_id: SlaveId,
    pub resources: Vec<Resource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<CommandInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_state_wire_names() {
        let json = serde_json::to_string(&TaskState::TaskRunning).unwrap();
        assert_eq!(json, "\"TASK_RUNNING\"");
        let state: TaskState = serde_json::from_str("\"TASK_KILLED\"").unwrap();
        assert_eq!(state, TaskState::TaskKilled);
    }

    #[test]
    fn terminal_states() {
        assert!(TaskState::TaskFinished.is_terminal());
        assert!(TaskState::TaskLost.is_terminal());
        assert!(!TaskState::TaskRunning.is_terminal());
        assert!(!TaskState::TaskStaging.is_terminal());
    }

    #[test]
    fn task_status_omits_absent_fields() {
        let status = TaskStatus::new("t1", TaskState::TaskRunning);
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["task_id"]["value"], "t1");
        assert!(value.get("slave_id").is_none());
        assert!(value.get("executor_id").is_none());
    }

    #[test]
    fn resource_type_field_is_renamed() {
        let cpus = Resource::scalar("cpus", 4.0);
        let value = serde_json::to_value(&cpus).unwrap();
        assert_eq!(value["type"], "SCALAR");
        assert_eq!(value["scalar"]["value"], 4.0);
        assert_eq!(value["role"], "*");

        let ports = Resource::ranges("ports", vec![Range { begin: 31000, end: 32000 }]);
        let value = serde_json::to_value(&ports).unwrap();
        assert_eq!(value["type"], "RANGES");
        assert_eq!(value["ranges"]["range"][0]["end"], 32000);
    }

    #[test]
    fn command_shell_defaults_to_true() {
        let cmd: CommandInfo = serde_json::from_str(r#"{"value":"echo hi"}"#).unwrap();
        assert!(cmd.shell);
    }
}
