use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::message::{Message, TaskId};
use crate::error::BusError;

// ============================================================================
// Message Bus
// ============================================================================
//
// Minimal in-process bus: one unbounded FIFO queue per registered task.
// Senders address tasks by `TaskId`; ordering is preserved per queue and
// nothing is promised across queues.
//
// ============================================================================

struct Mailbox {
    tx: mpsc::UnboundedSender<Message>,
    ready: bool,
}

/// Cloneable handle to the process-wide bus
#[derive(Clone, Default)]
pub struct Bus {
    mailboxes: Arc<DashMap<TaskId, Mailbox>>,
}

impl Bus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the inbound queue for `task`.
    pub fn register(&self, task: TaskId) -> Result<mpsc::UnboundedReceiver<Message>, BusError> {
        use dashmap::mapref::entry::Entry;

        match self.mailboxes.entry(task) {
            Entry::Occupied(_) => Err(BusError::AlreadyRegistered(task)),
            Entry::Vacant(slot) => {
                let (tx, rx) = mpsc::unbounded_channel();
                slot.insert(Mailbox { tx, ready: false });
                tracing::debug!(task = %task, "Inbound queue registered");
                Ok(rx)
            }
        }
    }

    pub fn mark_ready(&self, task: TaskId) {
        if let Some(mut mailbox) = self.mailboxes.get_mut(&task) {
            if !mailbox.ready {
                mailbox.ready = true;
                tracing::info!(task = %task, "Task ready");
            }
        }
    }

    pub fn is_ready(&self, task: TaskId) -> bool {
        self.mailboxes.get(&task).map(|m| m.ready).unwrap_or(false)
    }

    pub fn is_registered(&self, task: TaskId) -> bool {
        self.mailboxes.contains_key(&task)
    }

    /// Enqueue `msg` for `to`. Never blocks.
    pub fn send(&self, to: TaskId, msg: Message) -> Result<(), BusError> {
        let mailbox = self.mailboxes.get(&to).ok_or(BusError::UnknownTask(to))?;
        mailbox.tx.send(msg).map_err(|_| BusError::QueueClosed(to))
    }

    /// Drop the queue of `task`. Unregistering an absent task is a no-op.
    pub fn unregister(&self, task: TaskId) {
        if self.mailboxes.remove(&task).is_some() {
            tracing::debug!(task = %task, "Inbound queue released");
        }
    }
}
