// ============================================================================
// Tasks Module
// ============================================================================
//
// Independently scheduled tasks that only talk through the message bus.
//
// Structure:
// - core/           - Bus, message vocabulary, generic dispatch loop
// - infrastructure/ - Status server task, message dispatch task, supervisor
//
// ============================================================================

pub mod core;
mod infrastructure;

pub use self::core::{
    spawn_task, Bus, Dispatch, Message, MessageHandler, TaskContext, TaskExit, TaskHandle, TaskId,
};
pub use infrastructure::{init, start, Collaborators, MessageTask, ServiceTasks, StatusServerTask};
