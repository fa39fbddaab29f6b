use std::sync::Arc;

use super::{MessageTask, StatusServerTask};
use crate::config::StatsSettings;
use crate::error::ServiceError;
use crate::health::AppHealth;
use crate::metrics::{StatisticsReader, StatusServer};
use crate::models::ServiceIdentity;
use crate::tasks::core::{spawn_task, Bus, Message, TaskContext, TaskHandle, TaskId};
use crate::timers::TimerService;

// ============================================================================
// Supervisor - creates the service task pair
// ============================================================================
//
// Task Hierarchy:
//   init (caller)
//   ├── StatusServerTask   (TASK_STATUS_SERVER)
//   └── MessageTask        (TASK_MESSAGE_DISPATCH)
//
// Either both tasks are running when `init` returns Ok, or none is.
//
// ============================================================================

/// External collaborators shared by the two tasks
#[derive(Clone)]
pub struct Collaborators {
    pub status_server: Arc<dyn StatusServer>,
    pub timers: Arc<dyn TimerService>,
    pub statistics: Arc<dyn StatisticsReader>,
    pub health: AppHealth,
}

/// Running service task pair
pub struct ServiceTasks {
    bus: Bus,
    status_server: TaskHandle,
    message: TaskHandle,
}

/// Create and start the status-server task and the message-dispatch task.
///
/// Blocks the calling thread while a half-started pair is rolled back, so
/// async callers should use [`start`].
pub fn init(
    identity: &ServiceIdentity,
    collaborators: Collaborators,
    settings: &StatsSettings,
    bus: &Bus,
) -> Result<ServiceTasks, ServiceError> {
    tracing::debug!(service = %identity.name, "Initializing service task interface");

    let server_task = StatusServerTask::new(identity.clone(), collaborators.status_server.clone());
    let status_server = TaskContext::create(bus, TaskId::StatusServer)
        .map_err(ServiceError::from)
        .and_then(|ctx| spawn_task(ctx, move |ctx| server_task.start(ctx)))
        .map_err(|e| {
            tracing::error!(error = %e, "Initializing status server task: ERROR");
            e
        })?;

    let message_task = MessageTask::new(
        identity.clone(),
        settings,
        collaborators.timers,
        collaborators.statistics,
        collaborators.health,
    );
    let message = match TaskContext::create(bus, TaskId::MessageDispatch)
        .map_err(ServiceError::from)
        .and_then(|ctx| spawn_task(ctx, move |ctx| message_task.start(ctx)))
    {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!(error = %e, "Initializing message dispatch task: ERROR");
            abort_task(bus, status_server);
            return Err(e);
        }
    };

    tracing::debug!("Initializing service task interface: DONE");

    Ok(ServiceTasks {
        bus: bus.clone(),
        status_server,
        message,
    })
}

/// [`init`] on the blocking pool, for callers already inside a runtime.
pub async fn start(
    identity: ServiceIdentity,
    collaborators: Collaborators,
    settings: StatsSettings,
    bus: Bus,
) -> Result<ServiceTasks, ServiceError> {
    tokio::task::spawn_blocking(move || init(&identity, collaborators, &settings, &bus))
        .await
        .map_err(|_| ServiceError::InitAborted)?
}

/// Terminate a task that was started before a later setup step failed.
fn abort_task(bus: &Bus, handle: TaskHandle) {
    let task = handle.task_id();
    if let Err(e) = bus.send(task, Message::Terminate) {
        tracing::debug!(task = %task, error = %e, "Task already gone");
    }
    if let Err(e) = handle.join_blocking() {
        tracing::warn!(task = %task, error = %e, "Task did not exit cleanly");
    }
}

impl ServiceTasks {
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Send Terminate to both tasks and wait for them to exit.
    pub fn shutdown_blocking(self) -> Result<(), ServiceError> {
        tracing::info!("🛑 Shutting down service tasks");

        for task in [TaskId::StatusServer, TaskId::MessageDispatch] {
            if let Err(e) = self.bus.send(task, Message::Terminate) {
                tracing::debug!(task = %task, error = %e, "Task already gone");
            }
        }

        let status = self.status_server.join_blocking();
        let message = self.message.join_blocking();
        status?;
        message?;

        tracing::info!("🛑 Service tasks stopped");
        Ok(())
    }

    pub async fn shutdown(self) -> Result<(), ServiceError> {
        tokio::task::spawn_blocking(move || self.shutdown_blocking())
            .await
            .map_err(|_| ServiceError::TaskJoin(TaskId::MessageDispatch))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BusError;
    use crate::health::ApplicationHealth;
    use crate::test_support::{timer_id, CountingStats, MockStatusServer, MockTimers, STATS_TIMER_ID};
    use crate::timers::TimerKind;

    struct Fixture {
        bus: Bus,
        server: Arc<MockStatusServer>,
        timers: Arc<MockTimers>,
        stats: Arc<CountingStats>,
        health: AppHealth,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_timers(MockTimers::default())
        }

        fn with_timers(timers: MockTimers) -> Self {
            Self {
                bus: Bus::new(),
                server: Arc::new(MockStatusServer::default()),
                timers: Arc::new(timers),
                stats: Arc::new(CountingStats::default()),
                health: AppHealth::new(),
            }
        }

        fn init(&self, name: &str) -> Result<ServiceTasks, ServiceError> {
            init(
                &ServiceIdentity::new(name, "1.2.0"),
                self.collaborators(),
                &StatsSettings::default(),
                &self.bus,
            )
        }

        fn collaborators(&self) -> Collaborators {
            Collaborators {
                status_server: self.server.clone(),
                timers: self.timers.clone(),
                statistics: self.stats.clone(),
                health: self.health.clone(),
            }
        }

        async fn start(&self, name: &str) -> Result<ServiceTasks, ServiceError> {
            start(
                ServiceIdentity::new(name, "1.2.0"),
                self.collaborators(),
                StatsSettings::default(),
                self.bus.clone(),
            )
            .await
        }

        fn send(&self, msg: Message) {
            self.bus.send(TaskId::MessageDispatch, msg).unwrap();
        }
    }

    #[test]
    fn test_stats_package_arms_one_periodic_timer() {
        let fixture = Fixture::new();
        let tasks = fixture.init("mme").unwrap();
        tasks.shutdown_blocking().unwrap();

        let armed = fixture.timers.armed();
        assert_eq!(armed.len(), 1);
        assert_eq!(armed[0].kind, TimerKind::Periodic);
        assert_eq!(fixture.timers.cancelled(), vec![armed[0].id]);
    }

    #[test]
    fn test_other_package_arms_nothing() {
        let fixture = Fixture::new();
        let tasks = fixture.init("spgw").unwrap();
        tasks.shutdown_blocking().unwrap();

        assert!(fixture.timers.armed().is_empty());
        assert!(fixture.timers.cancelled().is_empty());
    }

    #[test]
    fn test_both_tasks_exit_on_terminate() {
        let fixture = Fixture::new();
        let tasks = fixture.init("MME").unwrap();
        assert!(fixture.bus.is_registered(TaskId::StatusServer));
        assert!(fixture.bus.is_registered(TaskId::MessageDispatch));

        tasks.shutdown_blocking().unwrap();

        assert!(!fixture.bus.is_registered(TaskId::StatusServer));
        assert!(!fixture.bus.is_registered(TaskId::MessageDispatch));
        assert_eq!(fixture.server.started().len(), 1);
        assert_eq!(fixture.server.stops(), 1);

        // Nothing is processed after Terminate
        let err = fixture.bus.send(TaskId::MessageDispatch, Message::ApplicationHealthy).unwrap_err();
        assert_eq!(err, BusError::UnknownTask(TaskId::MessageDispatch));
    }

    #[test]
    fn test_messages_flow_through_bus() {
        let fixture = Fixture::new();
        let tasks = fixture.init("MME").unwrap();

        fixture.send(Message::ApplicationHealthy);
        fixture.send(Message::TimerExpired { timer_id: timer_id(STATS_TIMER_ID) });
        fixture.send(Message::Unknown { id: 7000, name: "SGS_STATUS_IND".to_string() });
        tasks.bus().send(TaskId::StatusServer, Message::ApplicationUnhealthy).unwrap();

        tasks.shutdown_blocking().unwrap();

        // The status server task never touches health
        assert_eq!(fixture.health.get(), ApplicationHealth::Healthy);
        assert_eq!(fixture.stats.reads(), 1);
        assert_eq!(fixture.timers.acked(), vec![timer_id(STATS_TIMER_ID)]);
    }

    #[test]
    fn test_failed_second_task_tears_down_first() {
        let fixture = Fixture::new();
        let _squatter = fixture.bus.register(TaskId::MessageDispatch).unwrap();

        let result = fixture.init("MME");

        assert!(matches!(
            result,
            Err(ServiceError::Bus(BusError::AlreadyRegistered(TaskId::MessageDispatch)))
        ));
        assert!(!fixture.bus.is_registered(TaskId::StatusServer));
        assert_eq!(fixture.server.stops(), 1);
        assert!(fixture.timers.armed().is_empty());
    }

    #[test]
    fn test_failed_first_task_starts_nothing() {
        let fixture = Fixture::new();
        let _squatter = fixture.bus.register(TaskId::StatusServer).unwrap();

        assert!(fixture.init("MME").is_err());
        assert!(fixture.server.started().is_empty());
        assert!(!fixture.bus.is_registered(TaskId::MessageDispatch));
    }

    #[test]
    fn test_timer_failure_is_not_fatal() {
        let fixture = Fixture::with_timers(MockTimers::failing());
        let tasks = fixture.init("MME").unwrap();

        fixture.send(Message::ApplicationHealthy);
        tasks.shutdown_blocking().unwrap();

        assert_eq!(fixture.health.get(), ApplicationHealth::Healthy);
        assert!(fixture.timers.cancelled().is_empty());
    }

    #[tokio::test]
    async fn test_start_from_runtime_runs_and_shuts_down() {
        let fixture = Fixture::new();
        let tasks = fixture.start("MME").await.unwrap();

        fixture.send(Message::TimerExpired { timer_id: timer_id(STATS_TIMER_ID) });
        tasks.shutdown().await.unwrap();

        assert_eq!(fixture.stats.reads(), 1);
        assert_eq!(fixture.server.stops(), 1);
        assert!(!fixture.bus.is_registered(TaskId::MessageDispatch));
    }

    #[tokio::test]
    async fn test_start_rollback_does_not_block_runtime() {
        let fixture = Fixture::new();
        let _squatter = fixture.bus.register(TaskId::MessageDispatch).unwrap();

        let result = fixture.start("MME").await;

        assert!(matches!(
            result,
            Err(ServiceError::Bus(BusError::AlreadyRegistered(TaskId::MessageDispatch)))
        ));
        assert!(!fixture.bus.is_registered(TaskId::StatusServer));
        assert_eq!(fixture.server.stops(), 1);
    }
}
