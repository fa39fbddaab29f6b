// Private module declaration
mod server;

use chrono::Utc;
use prometheus::{IntCounter, IntGauge, Registry};
use std::time::Instant;

use crate::error::ServiceError;
use crate::health::AppHealth;

// Re-export for public API
pub use server::{HttpStatusServer, StatusServer};

// ============================================================================
// Statistics - Prometheus gauges refreshed on every stats timer expiry
// ============================================================================
//
// The message-dispatch task calls `read_statistics` each time the periodic
// statistics timer fires. Readers only snapshot process-level values into
// the registry; the status server exposes them on /metrics.
//
// ============================================================================

/// Synchronous statistics collection hook
pub trait StatisticsReader: Send + Sync {
    fn read_statistics(&self);
}

pub struct Statistics {
    registry: Registry,
    health: AppHealth,
    started_at: Instant,

    pub reads_total: IntCounter,
    pub last_read_timestamp: IntGauge,
    pub uptime_seconds: IntGauge,
    pub application_health: IntGauge,
}

impl Statistics {
    pub fn new(health: AppHealth) -> Result<Self, ServiceError> {
        let registry = Registry::new();

        let reads_total = IntCounter::new(
            "service_statistics_reads_total",
            "Total periodic statistics reads",
        )?;
        registry.register(Box::new(reads_total.clone()))?;

        let last_read_timestamp = IntGauge::new(
            "service_statistics_last_read_timestamp_seconds",
            "Unix time of the last statistics read",
        )?;
        registry.register(Box::new(last_read_timestamp.clone()))?;

        let uptime_seconds = IntGauge::new(
            "service_uptime_seconds",
            "Seconds since the statistics registry was created",
        )?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        let application_health = IntGauge::new(
            "service_application_health",
            "Application health (0=Unhealthy, 1=Healthy)",
        )?;
        registry.register(Box::new(application_health.clone()))?;

        Ok(Self {
            registry,
            health,
            started_at: Instant::now(),
            reads_total,
            last_read_timestamp,
            uptime_seconds,
            application_health,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl StatisticsReader for Statistics {
    fn read_statistics(&self) {
        self.reads_total.inc();
        self.last_read_timestamp.set(Utc::now().timestamp());
        self.uptime_seconds.set(self.started_at.elapsed().as_secs() as i64);
        self.application_health.set(i64::from(self.health.get().is_healthy()));

        tracing::debug!(reads = self.reads_total.get(), "Statistics read");
    }
}
