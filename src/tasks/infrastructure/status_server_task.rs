use async_trait::async_trait;
use std::sync::Arc;

use crate::metrics::StatusServer;
use crate::models::ServiceIdentity;
use crate::tasks::core::{Dispatch, Message, MessageHandler, TaskContext, TaskExit};

// ============================================================================
// Status Server Task
// ============================================================================
//
// Owns the external status server for the lifetime of the task. Only reacts
// to Terminate; everything else on its queue is logged and dropped.
//
// ============================================================================

pub struct StatusServerTask {
    identity: ServiceIdentity,
    server: Arc<dyn StatusServer>,
}

impl StatusServerTask {
    pub fn new(identity: ServiceIdentity, server: Arc<dyn StatusServer>) -> Self {
        Self { identity, server }
    }

    pub async fn start(mut self, ctx: TaskContext) -> TaskExit {
        if let Err(e) = self.server.start(&self.identity).await {
            tracing::error!(
                task = %ctx.task_id(),
                service = %self.identity.name,
                error = %e,
                "Status server failed to start"
            );
        }

        ctx.mark_ready();
        ctx.run(&mut self).await
    }
}

#[async_trait]
impl MessageHandler for StatusServerTask {
    async fn handle(&mut self, msg: Message) -> Dispatch {
        match msg {
            Message::Terminate => Dispatch::Terminate,
            other => {
                tracing::debug!(message = other.name(), "Unknown message ignored by status server task");
                Dispatch::Continue
            }
        }
    }

    async fn shutdown(&mut self) {
        self.server.stop().await;
    }
}
