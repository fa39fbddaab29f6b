use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use service_monitor::metrics::{HttpStatusServer, Statistics};
use service_monitor::tasks::{self, Bus, Collaborators};
use service_monitor::timers::TokioTimerService;
use service_monitor::{AppHealth, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Default to INFO level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true).with_thread_names(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,service_monitor=debug"))
        )
        .init();

    let config_path = std::env::args_os()
        .nth(1)
        .or_else(|| std::env::var_os("SERVICE_MONITOR_CONFIG"))
        .map(PathBuf::from);
    let config = Config::load(config_path.as_deref())?;
    let identity = config.identity();

    tracing::info!(
        service = %identity.name,
        version = %identity.version,
        "🚀 Starting service monitor"
    );

    // === 1. Shared process state ===
    let bus = Bus::new();
    let health = AppHealth::new();
    let statistics = Arc::new(Statistics::new(health.clone())?);
    tracing::info!("📊 Statistics registry created with {} metrics", statistics.registry().gather().len());

    // === 2. Collaborators ===
    let collaborators = Collaborators {
        status_server: Arc::new(HttpStatusServer::new(
            config.status_server_host.clone(),
            config.status_server_port,
            health.clone(),
            statistics.registry().clone(),
        )),
        timers: Arc::new(TokioTimerService::new(bus.clone())),
        statistics,
        health,
    };

    // === 3. Service tasks ===
    let service = tasks::start(identity, collaborators, config.stats_settings(), bus).await?;
    tracing::info!("✅ Service tasks started");

    wait_for_shutdown_signal().await?;
    tracing::info!("Shutdown signal received");

    service.shutdown().await?;
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        res = tokio::signal::ctrl_c() => res?,
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
