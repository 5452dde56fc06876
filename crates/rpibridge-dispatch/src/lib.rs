//! rpibridge-dispatch — serialized access to a scheduler driver.
//!
//! A scheduler driver is not safe to call concurrently, but directives
//! for it arrive over HTTP from many requests at once. The dispatcher
//! resolves this with a single-consumer queue:
//!
//! ```text
//! request ─┐
//! request ─┼─► mpsc (FIFO admission) ─► worker task ─► &mut driver
//! request ─┘        │                        │
//!                   └──── oneshot per caller ◄┘  (payload, status, error)
//! ```
//!
//! The worker task owns the driver outright; nothing else can reach it.
//! Exactly one action runs at any instant and actions run in admission
//! order.
//!
//! Failures that callers consider fatal are escalated over a typed
//! channel ([`FaultReporter`] → [`DriverSupervisor`]) and the supervisor
//! restarts the driver through the same queue.

pub mod action;
pub mod driver;
pub mod error;
pub mod queue;
pub mod supervisor;

pub use action::{ActionResult, BoxFuture, Completion};
pub use driver::{DynDriver, LaunchDirective, Operation, SchedulerDriver, TaskSpec};
pub use error::{ActionError, DispatchError, SupervisorError};
pub use queue::{DispatchConfig, Dispatcher, Ticket};
pub use supervisor::{DriverFault, DriverSupervisor, FaultReporter, SupervisorReport};
