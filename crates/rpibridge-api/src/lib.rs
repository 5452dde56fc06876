//! rpibridge-api — HTTP surface of the bridge.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/collect_resources` | Ask the driver for fresh offers |
//! | POST | `/launch_tasks` | Launch the tasks in a JSON directive |
//! | POST | `/kill_task/{task_id}` | Kill one task |
//! | POST | `/frameworks/{framework_id}/registered` | Acknowledge a framework registration |
//! | POST | `/frameworks/{framework_id}/status_update` | Forward a task status update |
//! | POST | `/frameworks/{framework_id}/offers` | Send the synthetic offer |
//! | GET | `/frameworks/{framework_id}/health` | Probe a framework process |
//! | GET | `/rpis` | List registered providers |
//! | POST | `/rpis` | Register a provider |
//! | GET | `/rpis/{name}` | Get a provider |
//! | DELETE | `/rpis/{name}` | Remove a provider |
//!
//! The three command routes answer `202 Accepted` with an empty body.
//! When the driver fails they answer with the dispatcher's status code
//! and escalate the failure to the driver supervisor.

pub mod command_handlers;
pub mod framework_handlers;
pub mod registry_handlers;
mod response;

#[cfg(test)]
mod test_support;

use axum::Router;
use axum::routing::{get, post};

use rpibridge_dispatch::{Dispatcher, DynDriver, FaultReporter};
use rpibridge_messenger::FrameworkManager;
use rpibridge_registry::RpiRegistry;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub dispatcher: Dispatcher<DynDriver>,
    pub faults: FaultReporter,
    pub frameworks: FrameworkManager,
    pub registry: RpiRegistry,
    /// Master process the command routes act for; recorded on failures.
    pub request_sent_by: String,
}

/// Build the complete API router.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/collect_resources", post(command_handlers::collect_resources))
        .route("/launch_tasks", post(command_handlers::launch_tasks))
        .route("/kill_task/{task_id}", post(command_handlers::kill_task))
        .route(
            "/frameworks/{framework_id}/registered",
            post(framework_handlers::notify_registered),
        )
        .route(
            "/frameworks/{framework_id}/status_update",
            post(framework_handlers::send_status_update),
        )
        .route("/frameworks/{framework_id}/offers", post(framework_handlers::send_offer))
        .route("/frameworks/{framework_id}/health", get(framework_handlers::health_check))
        .route(
            "/rpis",
            get(registry_handlers::list_rpis).post(registry_handlers::add_rpi),
        )
        .route(
            "/rpis/{name}",
            get(registry_handlers::get_rpi).delete(registry_handlers::delete_rpi),
        )
        .with_state(state)
}
