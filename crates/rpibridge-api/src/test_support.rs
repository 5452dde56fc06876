//! Shared fixtures for handler tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use rpibridge_dispatch::{
    DispatchConfig, Dispatcher, DriverSupervisor, DynDriver, LaunchDirective, SchedulerDriver,
    supervisor,
};
use rpibridge_messenger::{FrameworkManager, HyperTransport};
use rpibridge_proto::ProcessAddress;
use rpibridge_registry::RpiRegistry;

use crate::ApiState;

/// Records driver calls; optionally fails every directive.
#[derive(Clone, Default)]
pub(crate) struct StubDriver {
    calls: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl StubDriver {
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(call);
        if self.fail {
            anyhow::bail!("master unreachable");
        }
        Ok(())
    }
}

#[async_trait]
impl SchedulerDriver for StubDriver {
    async fn collect_resources(&mut self) -> anyhow::Result<()> {
        self.record("collect_resources".to_string())
    }

    async fn launch_tasks(&mut self, directive: &LaunchDirective) -> anyhow::Result<()> {
        self.record(format!("launch_tasks {}", directive.tasks.len()))
    }

    async fn kill_task(&mut self, task_id: &str) -> anyhow::Result<()> {
        self.record(format!("kill_task {task_id}"))
    }

    async fn restart(&mut self) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push("restart".to_string());
        Ok(())
    }
}

/// Handler state around `driver`, plus the supervisor end of the fault
/// channel.
pub(crate) fn state_with(driver: StubDriver) -> (ApiState, DriverSupervisor) {
    let master = ProcessAddress::new("127.0.0.1", 5050, "master").unwrap();
    let (dispatcher, _worker) =
        Dispatcher::spawn(Box::new(driver) as DynDriver, DispatchConfig::default());
    let (faults, supervisor) = supervisor::channel();
    let state = ApiState {
        dispatcher,
        faults,
        frameworks: FrameworkManager::new(master.clone(), HyperTransport::default()),
        registry: RpiRegistry::open_in_memory().unwrap(),
        request_sent_by: master.pid(),
    };
    (state, supervisor)
}

pub(crate) fn test_state() -> ApiState {
    state_with(StubDriver::default()).0
}
