use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use super::{TimerHandle, TimerId, TimerKind, TimerService};
use crate::error::TimerError;
use crate::tasks::{Bus, Message, TaskId};

// ============================================================================
// Tokio-backed Timer Service
// ============================================================================
//
// Each timer is a tokio task spawned on the runtime of the caller of `arm`:
//   sleep(period) -> post TimerExpired to owner -> wait for ack -> repeat
//
// ============================================================================

struct TimerEntry {
    handle: TimerHandle,
    ack: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

pub struct TokioTimerService {
    bus: Bus,
    timers: Arc<DashMap<TimerId, TimerEntry>>,
    next_id: AtomicU64,
}

impl TokioTimerService {
    pub fn new(bus: Bus) -> Self {
        Self {
            bus,
            timers: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn live_timers(&self) -> usize {
        self.timers.len()
    }

    fn allocate_id(&self) -> Result<TimerId, TimerError> {
        let raw = self.next_id.fetch_add(1, Ordering::Relaxed);
        TimerId::new(raw).ok_or_else(|| TimerError::Rejected("timer id space exhausted".to_string()))
    }
}

impl TimerService for TokioTimerService {
    fn arm(&self, owner: TaskId, period: Duration, kind: TimerKind) -> Result<TimerHandle, TimerError> {
        if period.is_zero() {
            return Err(TimerError::ZeroPeriod);
        }
        let runtime = Handle::try_current().map_err(|_| TimerError::NoRuntime)?;

        let handle = TimerHandle {
            id: self.allocate_id()?,
            period,
            kind,
            owner,
        };
        let ack = Arc::new(Notify::new());

        // Registered before the task exists so an early expiry is never "unknown".
        self.timers.insert(
            handle.id,
            TimerEntry {
                handle: handle.clone(),
                ack: ack.clone(),
                task: None,
            },
        );

        let task = runtime.spawn(run_timer(
            self.bus.clone(),
            self.timers.clone(),
            handle.clone(),
            ack,
        ));
        if let Some(mut entry) = self.timers.get_mut(&handle.id) {
            entry.task = Some(task);
        }

        tracing::debug!(
            timer_id = %handle.id,
            owner = %owner,
            period_ms = period.as_millis() as u64,
            kind = ?kind,
            "Timer armed"
        );

        Ok(handle)
    }

    fn exists(&self, id: TimerId) -> bool {
        self.timers.contains_key(&id)
    }

    fn acknowledge_expiry(&self, id: TimerId) {
        let kind = match self.timers.get(&id) {
            Some(entry) => {
                if entry.handle.kind == TimerKind::Periodic {
                    entry.ack.notify_one();
                }
                entry.handle.kind
            }
            None => return,
        };

        if kind == TimerKind::OneShot {
            self.timers.remove(&id);
        }
    }

    fn cancel(&self, id: TimerId) {
        if let Some((_, entry)) = self.timers.remove(&id) {
            if let Some(task) = entry.task {
                task.abort();
            }
            tracing::debug!(timer_id = %id, "Timer removed");
        }
    }
}

impl Drop for TokioTimerService {
    fn drop(&mut self) {
        for entry in self.timers.iter() {
            if let Some(task) = &entry.task {
                task.abort();
            }
        }
    }
}

async fn run_timer(
    bus: Bus,
    timers: Arc<DashMap<TimerId, TimerEntry>>,
    handle: TimerHandle,
    ack: Arc<Notify>,
) {
    loop {
        tokio::time::sleep(handle.period).await;

        if let Err(e) = bus.send(handle.owner, Message::TimerExpired { timer_id: handle.id }) {
            // Nobody can acknowledge this timer anymore
            timers.remove(&handle.id);
            tracing::warn!(timer_id = %handle.id, error = %e, "Timer owner unreachable, timer removed");
            return;
        }

        if handle.kind == TimerKind::OneShot {
            return;
        }
        ack.notified().await;
    }
}
