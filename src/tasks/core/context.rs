use async_trait::async_trait;
use std::future::Future;
use std::thread;
use tokio::sync::mpsc;

use super::bus::Bus;
use super::message::{Message, TaskId};
use crate::error::{BusError, ServiceError};

// ============================================================================
// Task Context - receive / dispatch / repeat
// ============================================================================
//
// Every service task is one OS thread driving one current-thread runtime
// around one inbound queue. The loop owns the queue; the handler owns its
// state and decides when to stop.
//
// Lifecycle:
//   create (queue registered) -> mark_ready -> run loop
//     -> Dispatch::Terminate -> release queue -> handler.shutdown() -> exit
//
// ============================================================================

/// Outcome of handling one message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Continue,
    Terminate,
}

/// Why a dispatch loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskExit {
    /// The handler asked to stop
    Terminated,
    /// The inbound queue was released from outside the task
    QueueClosed,
}

/// Per-task message handler driven by [`TaskContext::run`]
#[async_trait]
pub trait MessageHandler: Send {
    /// Handle exactly one message. Only called sequentially.
    async fn handle(&mut self, msg: Message) -> Dispatch;

    /// Release handler-owned resources after the loop stopped. Must not fail.
    async fn shutdown(&mut self) {}
}

pub struct TaskContext {
    task_id: TaskId,
    bus: Bus,
    inbound: mpsc::UnboundedReceiver<Message>,
    released: bool,
}

impl TaskContext {
    /// Register the inbound queue of `task_id` on `bus`.
    pub fn create(bus: &Bus, task_id: TaskId) -> Result<Self, BusError> {
        let inbound = bus.register(task_id)?;
        Ok(Self {
            task_id,
            bus: bus.clone(),
            inbound,
            released: false,
        })
    }

    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    pub fn mark_ready(&self) {
        self.bus.mark_ready(self.task_id);
    }

    /// Run the dispatch loop until the handler returns [`Dispatch::Terminate`]
    /// or the queue is closed.
    pub async fn run<H: MessageHandler>(mut self, handler: &mut H) -> TaskExit {
        self.mark_ready();

        let exit = loop {
            let Some(msg) = self.inbound.recv().await else {
                tracing::warn!(task = %self.task_id, "Inbound queue closed");
                break TaskExit::QueueClosed;
            };

            tracing::trace!(task = %self.task_id, message = msg.name(), "Dispatching message");

            if handler.handle(msg).await == Dispatch::Terminate {
                break TaskExit::Terminated;
            }
        };

        self.release();
        handler.shutdown().await;

        tracing::info!(task = %self.task_id, "{} terminated", self.task_id);
        exit
    }

    /// Close and unregister the inbound queue. Messages still queued are dropped.
    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.inbound.close();
        self.bus.unregister(self.task_id);
    }
}

impl Drop for TaskContext {
    fn drop(&mut self) {
        self.release();
    }
}

// ============================================================================
// Execution Units
// ============================================================================

/// Join handle of a running task thread
pub struct TaskHandle {
    task: TaskId,
    join: thread::JoinHandle<TaskExit>,
}

impl TaskHandle {
    pub fn task_id(&self) -> TaskId {
        self.task
    }

    pub fn join_blocking(self) -> Result<TaskExit, ServiceError> {
        let task = self.task;
        self.join.join().map_err(|_| ServiceError::TaskJoin(task))
    }
}

/// Start `body` on a dedicated, named OS thread with its own runtime.
///
/// Both runtime construction and thread creation failures are reported as
/// [`ServiceError::TaskCreation`]; in either case the context is dropped and its
/// queue unregistered.
pub fn spawn_task<F, Fut>(ctx: TaskContext, body: F) -> Result<TaskHandle, ServiceError>
where
    F: FnOnce(TaskContext) -> Fut + Send + 'static,
    Fut: Future<Output = TaskExit>,
{
    let task = ctx.task_id();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|source| ServiceError::TaskCreation { task, source })?;

    let join = thread::Builder::new()
        .name(task.to_string())
        .spawn(move || runtime.block_on(body(ctx)))
        .map_err(|source| ServiceError::TaskCreation { task, source })?;

    Ok(TaskHandle { task, join })
}
