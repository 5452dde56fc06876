//! End-to-end tests through the router.
//!
//! Drives the full HTTP surface with `tower::ServiceExt::oneshot`, a
//! stub scheduler driver and a running driver supervisor.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tokio::sync::watch;
use tower::ServiceExt;

use rpibridge_api::{ApiState, build_router};
use rpibridge_dispatch::{
    DispatchConfig, Dispatcher, DriverSupervisor, DynDriver, LaunchDirective, SchedulerDriver,
    supervisor,
};
use rpibridge_messenger::{FrameworkManager, HyperTransport};
use rpibridge_proto::ProcessAddress;
use rpibridge_registry::RpiRegistry;

#[derive(Clone, Default)]
struct StubDriver {
    log: Arc<Mutex<Vec<String>>>,
    fail: bool,
    delay: Duration,
}

impl StubDriver {
    fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn directive(&self, entry: String) -> anyhow::Result<()> {
        self.log.lock().unwrap().push(entry);
        if self.fail {
            anyhow::bail!("driver is disconnected");
        }
        Ok(())
    }
}

#[async_trait]
impl SchedulerDriver for StubDriver {
    async fn collect_resources(&mut self) -> anyhow::Result<()> {
        tokio::time::sleep(self.delay).await;
        self.directive("collect".to_string())
    }

    async fn launch_tasks(&mut self, directive: &LaunchDirective) -> anyhow::Result<()> {
        let ids: Vec<&str> = directive.tasks.iter().map(|t| t.task_id.as_str()).collect();
        self.directive(format!("launch {}", ids.join(",")))
    }

    async fn kill_task(&mut self, task_id: &str) -> anyhow::Result<()> {
        self.directive(format!("kill {task_id}"))
    }

    async fn restart(&mut self) -> anyhow::Result<()> {
        self.log.lock().unwrap().push("restart".to_string());
        Ok(())
    }
}

struct Harness {
    state: ApiState,
    dispatcher: Dispatcher<DynDriver>,
    supervisor: DriverSupervisor,
}

fn harness(driver: StubDriver) -> Harness {
    harness_with(driver, DispatchConfig::default())
}

fn harness_with(driver: StubDriver, config: DispatchConfig) -> Harness {
    let master = ProcessAddress::new("127.0.0.1", 5050, "master").unwrap();
    let (dispatcher, _worker) = Dispatcher::spawn(Box::new(driver) as DynDriver, config);
    let (faults, supervisor) = supervisor::channel();
    let state = ApiState {
        dispatcher: dispatcher.clone(),
        faults,
        frameworks: FrameworkManager::new(master.clone(), HyperTransport::default()),
        registry: RpiRegistry::open_in_memory().unwrap(),
        request_sent_by: master.pid(),
    };
    Harness {
        state,
        dispatcher,
        supervisor,
    }
}

fn post(uri: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    resp.into_body().collect().await.unwrap().to_bytes().to_vec()
}

// ── Command bridges ────────────────────────────────────────────────

#[tokio::test]
async fn launch_tasks_success_is_202_with_empty_body() {
    let driver = StubDriver::default();
    let h = harness(driver.clone());

    let resp = build_router(h.state)
        .oneshot(post("/launch_tasks", r#"{"tasks":[{"task_id":"t1"},{"task_id":"t2"}]}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    assert!(body_bytes(resp).await.is_empty());
    assert_eq!(driver.log(), vec!["launch t1,t2"]);
}

#[tokio::test]
async fn launch_tasks_bad_body_never_reaches_driver() {
    let driver = StubDriver::default();
    let h = harness(driver.clone());
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let supervising = tokio::spawn(h.supervisor.run(h.dispatcher, shutdown_rx));

    let resp = build_router(h.state)
        .oneshot(post("/launch_tasks", "not-json"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Router and reporters are gone; the supervisor drains and stops.
    let report = supervising.await.unwrap().unwrap();
    assert_eq!(report.faults, 0);
    assert!(driver.log().is_empty());
}

#[tokio::test]
async fn failing_driver_is_500_with_one_escalated_fault() {
    let driver = StubDriver {
        fail: true,
        ..StubDriver::default()
    };
    let h = harness(driver.clone());
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let supervising = tokio::spawn(h.supervisor.run(h.dispatcher, shutdown_rx));

    let resp = build_router(h.state)
        .oneshot(post("/launch_tasks", r#"{"tasks":[{"task_id":"t1"}]}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let report = supervising.await.unwrap().unwrap();
    assert_eq!(report.faults, 1);
    assert_eq!(report.restarts, 1);
    assert_eq!(driver.log(), vec!["launch t1", "restart"]);
}

#[tokio::test]
async fn timed_out_directive_is_504_and_not_escalated() {
    let driver = StubDriver {
        delay: Duration::from_millis(80),
        ..StubDriver::default()
    };
    let h = harness_with(
        driver.clone(),
        DispatchConfig {
            submit_timeout: Some(Duration::from_millis(20)),
        },
    );
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let supervising = tokio::spawn(h.supervisor.run(h.dispatcher, shutdown_rx));

    let resp = build_router(h.state)
        .oneshot(post("/collect_resources", ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);

    let report = supervising.await.unwrap().unwrap();
    assert_eq!(report.faults, 0);
    assert_eq!(report.restarts, 0);
}

#[tokio::test]
async fn kill_task_routes_path_param() {
    let driver = StubDriver::default();
    let h = harness(driver.clone());

    let resp = build_router(h.state)
        .oneshot(post("/kill_task/web-7", ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    assert_eq!(driver.log(), vec!["kill web-7"]);
}

#[tokio::test]
async fn collect_resources_against_stopped_worker_is_503() {
    let master = ProcessAddress::new("127.0.0.1", 5050, "master").unwrap();
    let (dispatcher, worker) = Dispatcher::spawn(
        Box::new(StubDriver::default()) as DynDriver,
        DispatchConfig::default(),
    );
    let (faults, _supervisor) = supervisor::channel();
    let state = ApiState {
        dispatcher,
        faults,
        frameworks: FrameworkManager::new(master.clone(), HyperTransport::default()),
        registry: RpiRegistry::open_in_memory().unwrap(),
        request_sent_by: master.pid(),
    };
    worker.abort();
    let _ = worker.await;

    let resp = build_router(state)
        .oneshot(post("/collect_resources", ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// ── Registry ───────────────────────────────────────────────────────

#[tokio::test]
async fn registry_lifecycle() {
    let h = harness(StubDriver::default());
    let router = build_router(h.state);

    let resp = router
        .clone()
        .oneshot(post("/rpis", r#"{"name":"k8s","url":"http://10.0.0.2:4000"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = router
        .clone()
        .oneshot(Request::builder().uri("/rpis").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["data"][0]["name"], "k8s");

    let resp = router
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/rpis/k8s")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = router
        .oneshot(Request::builder().uri("/rpis/k8s").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn registry_rejects_unnamed_provider() {
    let h = harness(StubDriver::default());
    let resp = build_router(h.state)
        .oneshot(post("/rpis", r#"{"name":"","url":"http://10.0.0.2:4000"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ── Framework messaging ────────────────────────────────────────────

#[tokio::test]
async fn framework_registration_is_forwarded() {
    let received = Arc::new(Mutex::new(Vec::<String>::new()));
    let seen = received.clone();
    let framework = axum::Router::new().route(
        "/scheduler-1/mesos.internal.FrameworkRegisteredMessage",
        axum::routing::post(move |headers: axum::http::HeaderMap| {
            let seen = seen.clone();
            async move {
                let from = headers["libprocess-from"].to_str().unwrap().to_string();
                seen.lock().unwrap().push(from);
                StatusCode::ACCEPTED
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, framework).await.unwrap();
    });

    let h = harness(StubDriver::default());
    let body = format!(r#"{{"name":"marathon","pid":"scheduler-1@127.0.0.1:{port}"}}"#);
    let req = Request::builder()
        .method("POST")
        .uri("/frameworks/fw-1/registered")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();

    let resp = build_router(h.state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    assert_eq!(*received.lock().unwrap(), vec!["127.0.0.1:5050/master".to_string()]);
}

/// A framework process stand-in that records `(message type, body)` for
/// every message and answers with `status`.
async fn stub_framework(status: StatusCode) -> (u16, Arc<Mutex<Vec<(String, serde_json::Value)>>>) {
    let received = Arc::new(Mutex::new(Vec::new()));
    let log = received.clone();
    let framework = axum::Router::new().route(
        "/scheduler-1/{message_type}",
        axum::routing::post(
            move |axum::extract::Path(message_type): axum::extract::Path<String>,
                  body: axum::body::Bytes| {
                let log = log.clone();
                async move {
                    let body = serde_json::from_slice(&body).unwrap();
                    log.lock().unwrap().push((message_type, body));
                    status
                }
            },
        ),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, framework).await.unwrap();
    });
    (port, received)
}

fn post_owned(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn status_update_is_forwarded() {
    let (port, received) = stub_framework(StatusCode::ACCEPTED).await;
    let h = harness(StubDriver::default());
    let body = format!(
        r#"{{"pid":"scheduler-1@127.0.0.1:{port}","status":{{"task_id":{{"value":"web-1"}},"state":"TASK_RUNNING","slave_id":{{"value":"rpi-slave"}}}}}}"#
    );

    let resp = build_router(h.state)
        .oneshot(post_owned("/frameworks/fw-1/status_update", body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(json["success"], true);

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    let (message_type, body) = &received[0];
    assert_eq!(message_type, "mesos.internal.StatusUpdateMessage");
    let update = &body["update"];
    assert_eq!(update["framework_id"]["value"], "fw-1");
    assert_eq!(update["status"]["task_id"]["value"], "web-1");
    assert_eq!(update["slave_id"]["value"], "rpi-slave");
    assert!(update["uuid"].is_string());
}

#[tokio::test]
async fn rejected_status_update_is_bad_gateway() {
    let (port, _received) = stub_framework(StatusCode::NOT_FOUND).await;
    let h = harness(StubDriver::default());
    let body = format!(
        r#"{{"pid":"scheduler-1@127.0.0.1:{port}","status":{{"task_id":{{"value":"web-1"}},"state":"TASK_FAILED"}}}}"#
    );

    let resp = build_router(h.state)
        .oneshot(post_owned("/frameworks/fw-1/status_update", body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("404"));
}

#[tokio::test]
async fn offer_is_forwarded_as_single_offer_batch() {
    let (port, received) = stub_framework(StatusCode::OK).await;
    let h = harness(StubDriver::default());
    let body = format!(
        r#"{{"pid":"scheduler-1@127.0.0.1:{port}","offer_id":"offer-1","slave_id":"rpi-slave","slave_pid":"slave(1)@10.0.0.9:5051"}}"#
    );

    let resp = build_router(h.state)
        .oneshot(post_owned("/frameworks/fw-1/offers", body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    let (message_type, body) = &received[0];
    assert_eq!(message_type, "mesos.internal.ResourceOffersMessage");
    assert_eq!(body["offers"].as_array().unwrap().len(), 1);
    assert_eq!(body["offers"][0]["id"]["value"], "offer-1");
    assert_eq!(body["offers"][0]["framework_id"]["value"], "fw-1");
    assert_eq!(body["offers"][0]["slave_id"]["value"], "rpi-slave");
    assert_eq!(body["pids"], serde_json::json!(["slave(1)@10.0.0.9:5051"]));
}

#[tokio::test]
async fn health_reports_live_framework() {
    let (port, _received) = stub_framework(StatusCode::ACCEPTED).await;
    let h = harness(StubDriver::default());

    let uri = format!("/frameworks/fw-1/health?pid=scheduler-1@127.0.0.1:{port}");
    let resp = build_router(h.state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["framework_id"], "fw-1");
    assert_eq!(json["data"]["healthy"], true);
}

#[tokio::test]
async fn health_reports_stopped_framework_as_unhealthy() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let h = harness(StubDriver::default());

    let uri = format!("/frameworks/fw-1/health?pid=scheduler-1@127.0.0.1:{port}");
    let resp = build_router(h.state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(json["data"]["healthy"], false);
}
