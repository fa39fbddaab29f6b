use crate::tasks::TaskId;

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised by the message bus
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BusError {
    #[error("Task {0} already has an inbound queue registered")]
    AlreadyRegistered(TaskId),

    #[error("No inbound queue registered for task {0}")]
    UnknownTask(TaskId),

    #[error("Inbound queue of task {0} is closed")]
    QueueClosed(TaskId),
}

/// Errors raised by the timer subsystem
#[derive(Debug, thiserror::Error)]
pub enum TimerError {
    #[error("Timer period must be non-zero")]
    ZeroPeriod,

    #[error("No async runtime available to drive timers")]
    NoRuntime,

    #[error("Timer setup rejected: {0}")]
    Rejected(String),
}

/// Crate-level error returned by the supervisor and the collaborators
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to create task {task}: {source}")]
    TaskCreation {
        task: TaskId,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to join task {0}")]
    TaskJoin(TaskId),

    #[error("Service task initialization did not complete")]
    InitAborted,

    #[error(transparent)]
    Bus(#[from] BusError),

    #[error(transparent)]
    Timer(#[from] TimerError),

    #[error("Status server error: {0}")]
    StatusServer(String),

    #[error(transparent)]
    Metrics(#[from] prometheus::Error),
}
