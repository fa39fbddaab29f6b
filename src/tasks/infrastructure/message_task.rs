use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::StatsSettings;
use crate::health::{AppHealth, ApplicationHealth};
use crate::metrics::StatisticsReader;
use crate::models::ServiceIdentity;
use crate::tasks::core::{Dispatch, Message, MessageHandler, TaskContext, TaskExit, TaskId};
use crate::timers::{TimerId, TimerKind, TimerService};

// ============================================================================
// Message Dispatch Task
// ============================================================================
//
// Responsibilities:
// - Own the periodic statistics timer (only for the statistics package)
// - Read statistics on each expiry of that timer, then acknowledge it
// - Acknowledge expiries of other live timers multiplexed on the same kind
// - Apply application health updates
//
// ============================================================================

pub struct MessageTask {
    identity: ServiceIdentity,
    supports_periodic_stats: bool,
    stats_period: Duration,
    timers: Arc<dyn TimerService>,
    statistics: Arc<dyn StatisticsReader>,
    health: AppHealth,
    stats_timer: Option<TimerId>,
}

impl MessageTask {
    pub fn new(
        identity: ServiceIdentity,
        settings: &StatsSettings,
        timers: Arc<dyn TimerService>,
        statistics: Arc<dyn StatisticsReader>,
        health: AppHealth,
    ) -> Self {
        // Other packages do not support statistics yet
        let supports_periodic_stats = identity.is_package(&settings.package_name);

        Self {
            identity,
            supports_periodic_stats,
            stats_period: settings.period,
            timers,
            statistics,
            health,
            stats_timer: None,
        }
    }

    pub fn supports_periodic_stats(&self) -> bool {
        self.supports_periodic_stats
    }

    pub fn stats_timer(&self) -> Option<TimerId> {
        self.stats_timer
    }

    pub async fn start(mut self, ctx: TaskContext) -> TaskExit {
        ctx.mark_ready();

        if self.supports_periodic_stats {
            self.arm_stats_timer(ctx.task_id());
        }

        ctx.run(&mut self).await
    }

    fn arm_stats_timer(&mut self, owner: TaskId) {
        match self.timers.arm(owner, self.stats_period, TimerKind::Periodic) {
            Ok(handle) => {
                tracing::info!(
                    service = %self.identity.name,
                    timer_id = %handle.id,
                    period_secs = self.stats_period.as_secs(),
                    "Periodic statistics timer started"
                );
                self.stats_timer = Some(handle.id);
            }
            Err(e) => {
                tracing::error!(
                    service = %self.identity.name,
                    error = %e,
                    "Periodic statistics timer start failed, statistics disabled"
                );
                self.stats_timer = None;
            }
        }
    }

    fn on_timer_expired(&self, timer_id: TimerId) {
        if !self.timers.exists(timer_id) {
            tracing::trace!(timer_id = %timer_id, "Stale timer expiry ignored");
            return;
        }

        if self.stats_timer == Some(timer_id) {
            self.statistics.read_statistics();
        }

        self.timers.acknowledge_expiry(timer_id);
    }
}

#[async_trait]
impl MessageHandler for MessageTask {
    async fn handle(&mut self, msg: Message) -> Dispatch {
        match msg {
            Message::TimerExpired { timer_id } => self.on_timer_expired(timer_id),
            Message::ApplicationHealthy => self.health.set(ApplicationHealth::Healthy),
            Message::ApplicationUnhealthy => self.health.set(ApplicationHealth::Unhealthy),
            Message::Terminate => return Dispatch::Terminate,
            other => {
                tracing::debug!(message = other.name(), "Unknown message ignored by message task");
            }
        }
        Dispatch::Continue
    }

    async fn shutdown(&mut self) {
        if let Some(timer_id) = self.stats_timer.take() {
            self.timers.cancel(timer_id);
        }
    }
}
