// ============================================================================
// Service Tasks
// ============================================================================
//
// The concrete task pair and the supervisor that starts it:
// - Status server task
// - Message dispatch task (statistics timer, application health)
// - Supervisor / init
//
// ============================================================================

// Private module declarations
mod message_task;
mod status_server_task;
mod supervisor;

// Re-export for public API
pub use message_task::MessageTask;
pub use status_server_task::StatusServerTask;
pub use supervisor::{init, start, Collaborators, ServiceTasks};
