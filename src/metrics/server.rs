use actix_web::dev::ServerHandle;
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use prometheus::{Encoder, Registry, TextEncoder};
use std::net::SocketAddr;
use std::thread;
use tokio::sync::{oneshot, Mutex};

use crate::error::ServiceError;
use crate::health::AppHealth;
use crate::models::{ServiceIdentity, ServiceInfo, SERVICE_STATE_ALIVE};

/// Externally visible status server owned by the status-server task
#[async_trait]
pub trait StatusServer: Send + Sync {
    /// Start serving for `identity`. Returns once the server is ready.
    async fn start(&self, identity: &ServiceIdentity) -> Result<(), ServiceError>;

    /// Stop serving. Stopping a server that is not running is a no-op.
    async fn stop(&self);
}

struct StatusState {
    identity: ServiceIdentity,
    health: AppHealth,
    registry: Registry,
    started_at: DateTime<Utc>,
}

struct RunningServer {
    handle: ServerHandle,
    addr: SocketAddr,
    thread: thread::JoinHandle<()>,
}

/// HTTP status server exposing /metrics, /health and /info
pub struct HttpStatusServer {
    host: String,
    port: u16,
    health: AppHealth,
    registry: Registry,
    running: Mutex<Option<RunningServer>>,
}

impl HttpStatusServer {
    pub fn new(host: impl Into<String>, port: u16, health: AppHealth, registry: Registry) -> Self {
        Self {
            host: host.into(),
            port,
            health,
            registry,
            running: Mutex::new(None),
        }
    }

    /// Bound address while running
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.running.lock().await.as_ref().map(|r| r.addr)
    }
}

#[async_trait]
impl StatusServer for HttpStatusServer {
    async fn start(&self, identity: &ServiceIdentity) -> Result<(), ServiceError> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return Ok(());
        }

        let state = web::Data::new(StatusState {
            identity: identity.clone(),
            health: self.health.clone(),
            registry: self.registry.clone(),
            started_at: Utc::now(),
        });
        let host = self.host.clone();
        let port = self.port;
        let (ready_tx, ready_rx) = oneshot::channel();

        // actix-web runs on its own system, away from the task's runtime
        let thread = thread::Builder::new()
            .name("status-http".to_string())
            .spawn(move || {
                actix_web::rt::System::new().block_on(async move {
                    let bound = HttpServer::new(move || App::new().app_data(state.clone()).configure(routes))
                        .workers(1)
                        .disable_signals()
                        .bind((host.as_str(), port));

                    let server = match bound {
                        Ok(server) => server,
                        Err(e) => {
                            let _ = ready_tx.send(Err(e.to_string()));
                            return;
                        }
                    };

                    let Some(addr) = server.addrs().first().copied() else {
                        let _ = ready_tx.send(Err("no listening address".to_string()));
                        return;
                    };

                    let server = server.run();
                    let _ = ready_tx.send(Ok((server.handle(), addr)));

                    if let Err(e) = server.await {
                        tracing::error!("Status server error: {}", e);
                    }
                });
            })
            .map_err(|e| ServiceError::StatusServer(format!("failed to spawn server thread: {e}")))?;

        let (handle, addr) = ready_rx
            .await
            .map_err(|_| ServiceError::StatusServer("server thread exited before ready".to_string()))?
            .map_err(|e| ServiceError::StatusServer(format!("bind {}:{} failed: {}", self.host, port, e)))?;

        tracing::info!(
            service = %identity.name,
            version = %identity.version,
            "📊 Status server listening on http://{}",
            addr
        );

        *running = Some(RunningServer { handle, addr, thread });
        Ok(())
    }

    async fn stop(&self) {
        let Some(running) = self.running.lock().await.take() else {
            return;
        };

        running.handle.stop(true).await;
        let joined = tokio::task::spawn_blocking(move || running.thread.join()).await;
        if server_thread_exited(joined) {
            tracing::info!("Status server stopped");
        }
    }
}

/// Log how the server thread ended. `true` only for a clean exit.
fn server_thread_exited(joined: Result<thread::Result<()>, tokio::task::JoinError>) -> bool {
    match joined {
        Ok(Ok(())) => true,
        Ok(Err(_)) => {
            tracing::error!("Status server thread panicked");
            false
        }
        Err(e) => {
            tracing::warn!(error = %e, "Status server thread could not be joined");
            false
        }
    }
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/metrics", web::get().to(metrics_handler))
        .route("/health", web::get().to(health_handler))
        .route("/info", web::get().to(info_handler));
}

async fn metrics_handler(state: web::Data<StatusState>) -> impl Responder {
    let encoder = TextEncoder::new();
    let metric_families = state.registry.gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return HttpResponse::InternalServerError().finish();
    }

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(buffer)
}

async fn health_handler(state: web::Data<StatusState>) -> impl Responder {
    let healthy = state.health.get().is_healthy();
    let body = serde_json::json!({
        "status": if healthy { "healthy" } else { "unhealthy" },
        "service": state.identity.name,
    });

    if healthy {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}

async fn info_handler(state: web::Data<StatusState>) -> impl Responder {
    HttpResponse::Ok().json(ServiceInfo {
        name: state.identity.name.clone(),
        version: state.identity.version.clone(),
        state: SERVICE_STATE_ALIVE,
        health: state.health.get(),
        start_time_secs: state.started_at.timestamp(),
    })
}
