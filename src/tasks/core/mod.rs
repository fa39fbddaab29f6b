// ============================================================================
// Core Task Abstractions
// ============================================================================
//
// Bus, message vocabulary and the generic dispatch loop.
// Concrete service tasks build on these.
//
// ============================================================================

pub mod bus;
pub mod context;
pub mod message;

pub use bus::Bus;
pub use context::{spawn_task, Dispatch, MessageHandler, TaskContext, TaskExit, TaskHandle};
pub use message::{Message, TaskId};
