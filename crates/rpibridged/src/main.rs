//! rpibridged — the rpibridge daemon.
//!
//! Single binary that assembles the bridge:
//! - Provider registry (redb)
//! - Libprocess scheduler driver, owned by the serialized dispatcher
//! - Driver supervisor
//! - Framework messaging bridge
//! - HTTP API (command bridges, framework messaging, registry)
//!
//! # Usage
//!
//! ```text
//! rpibridged --config /etc/rpibridge/rpibridge.toml --port 4000
//! ```

mod config;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use rpibridge_api::ApiState;
use rpibridge_dispatch::{DispatchConfig, Dispatcher, DynDriver, supervisor};
use rpibridge_messenger::{FrameworkManager, HyperTransport, LibprocessDriver};
use rpibridge_registry::RpiRegistry;

use crate::config::BridgeConfig;

const DEFAULT_LOG_FILTER: &str = "info,rpibridged=debug,rpibridge=debug";

#[derive(Parser)]
#[command(name = "rpibridged", about = "rpibridge daemon")]
struct Cli {
    /// Path to rpibridge.toml. Built-in defaults apply without one.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port to listen on.
    #[arg(long)]
    port: Option<u16>,

    /// Master identity the bridge speaks as (`id@host:port`).
    #[arg(long)]
    master: Option<String>,

    /// Cluster master the scheduler driver talks to.
    #[arg(long)]
    driver_master: Option<String>,

    /// Data directory for the provider registry.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    /// Load the config file (if any) and apply flag overrides.
    fn load_config(&self) -> anyhow::Result<BridgeConfig> {
        let mut config = match &self.config {
            Some(path) => BridgeConfig::from_file(path)?,
            None => BridgeConfig::default(),
        };
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(master) = &self.master {
            config.master.address = master.clone();
        }
        if let Some(driver_master) = &self.driver_master {
            config.driver.master = driver_master.clone();
        }
        if let Some(data_dir) = &self.data_dir {
            config.registry.data_dir = data_dir.clone();
        }
        Ok(config)
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = cli.load_config()?;
    run(config).await
}

async fn run(config: BridgeConfig) -> anyhow::Result<()> {
    info!("rpibridge daemon starting");

    let master = config.master_address()?;
    let driver_config = config.driver_config()?;
    let request_timeout = config.request_timeout()?;
    let submit_timeout = config.submit_timeout()?;
    let capacity = config.offer_capacity()?;

    // ── Initialize subsystems ──────────────────────────────────

    // Provider registry.
    let data_dir = &config.registry.data_dir;
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;
    let db_path = data_dir.join("rpibridge.redb");
    let registry = RpiRegistry::open(&db_path)?;
    info!(path = ?db_path, "provider registry opened");

    // Outbound transport shared by the driver and the messaging bridge.
    let transport = HyperTransport::new(request_timeout);

    // Scheduler driver, moved into the dispatcher worker.
    let driver_master = driver_config.master.clone();
    let driver = LibprocessDriver::new(master.clone(), transport.clone(), driver_config);
    let (dispatcher, worker) = Dispatcher::spawn(
        Box::new(driver) as DynDriver,
        DispatchConfig { submit_timeout },
    );
    info!(master = %driver_master, ?submit_timeout, "scheduler driver dispatcher started");

    // Framework messaging bridge.
    let frameworks = FrameworkManager::new(master.clone(), transport).with_capacity(capacity);
    info!(%master, timeout = ?request_timeout, "framework messaging bridge initialized");

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut server_shutdown = shutdown_rx.clone();

    // ── Start background tasks ─────────────────────────────────

    let (faults, driver_supervisor) = supervisor::channel();
    let mut supervisor_handle =
        tokio::spawn(driver_supervisor.run(dispatcher.clone(), shutdown_rx));

    // ── Start API server ───────────────────────────────────────

    let router = rpibridge_api::build_router(ApiState {
        dispatcher: dispatcher.clone(),
        faults,
        frameworks,
        registry,
        request_sent_by: master.pid(),
    });
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "API server starting");

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = server_shutdown.changed().await;
            })
            .await
    });

    // Run until Ctrl-C or until the supervisor gives up on the driver.
    let supervised = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("installing Ctrl-C handler")?;
            info!("shutdown signal received");
            None
        }
        joined = &mut supervisor_handle => Some(joined),
    };
    let _ = shutdown_tx.send(true);

    let supervised = match supervised {
        Some(joined) => joined,
        None => supervisor_handle.await,
    };

    server_handle.await.context("API server task")??;

    // The router and supervisor hold the other handles; once they are
    // gone the worker drains its queue and returns the driver.
    drop(dispatcher);
    let _driver = worker.await.context("dispatcher worker")?;

    match supervised.context("driver supervisor task")? {
        Ok(report) => {
            info!(faults = report.faults, restarts = report.restarts, "rpibridge daemon stopped");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "scheduler driver could not be recovered");
            Err(e.into())
        }
    }
}
