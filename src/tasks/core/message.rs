use std::fmt;

use crate::timers::TimerId;

// ============================================================================
// Bus Messages
// ============================================================================
//
// The vocabulary understood by the service tasks. Kinds owned by other
// subsystems travel as `Unknown` so a task can log and drop them instead of
// failing on input it was never meant to interpret.
//
// ============================================================================

/// Address of a task on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskId {
    StatusServer,
    MessageDispatch,
    /// Any other task sharing the bus
    Named(&'static str),
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskId::StatusServer => f.write_str("TASK_STATUS_SERVER"),
            TaskId::MessageDispatch => f.write_str("TASK_MESSAGE_DISPATCH"),
            TaskId::Named(name) => f.write_str(name),
        }
    }
}

/// A message delivered to a task's inbound queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Graceful shutdown request
    Terminate,
    /// A previously armed timer fired
    TimerExpired { timer_id: TimerId },
    /// Mark the process healthy
    ApplicationHealthy,
    /// Mark the process unhealthy
    ApplicationUnhealthy,
    /// A kind defined outside this crate
    Unknown { id: u32, name: String },
}

impl Message {
    pub fn name(&self) -> &str {
        match self {
            Message::Terminate => "TERMINATE_MESSAGE",
            Message::TimerExpired { .. } => "TIMER_HAS_EXPIRED",
            Message::ApplicationHealthy => "APPLICATION_HEALTHY_MSG",
            Message::ApplicationUnhealthy => "APPLICATION_UNHEALTHY_MSG",
            Message::Unknown { name, .. } => name,
        }
    }
}
