//! In-memory collaborator doubles shared by the task tests.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{ServiceError, TimerError};
use crate::metrics::{StatisticsReader, StatusServer};
use crate::models::ServiceIdentity;
use crate::tasks::TaskId;
use crate::timers::{TimerHandle, TimerId, TimerKind, TimerService};

pub const STATS_TIMER_ID: u64 = 7;

pub fn timer_id(raw: u64) -> TimerId {
    TimerId::new(raw).unwrap()
}

#[derive(Default)]
pub struct MockTimers {
    pub fail_arm: bool,
    pub armed: Mutex<Vec<TimerHandle>>,
    pub live: Mutex<HashSet<TimerId>>,
    pub acked: Mutex<Vec<TimerId>>,
    pub cancelled: Mutex<Vec<TimerId>>,
}

impl MockTimers {
    pub fn failing() -> Self {
        Self {
            fail_arm: true,
            ..Self::default()
        }
    }

    /// Make `id` known to the timer service as if another subsystem armed it.
    pub fn with_foreign_timer(self, id: TimerId) -> Self {
        self.live.lock().unwrap().insert(id);
        self
    }

    pub fn armed(&self) -> Vec<TimerHandle> {
        self.armed.lock().unwrap().clone()
    }

    pub fn acked(&self) -> Vec<TimerId> {
        self.acked.lock().unwrap().clone()
    }

    pub fn cancelled(&self) -> Vec<TimerId> {
        self.cancelled.lock().unwrap().clone()
    }
}

impl TimerService for MockTimers {
    fn arm(&self, owner: TaskId, period: Duration, kind: TimerKind) -> Result<TimerHandle, TimerError> {
        if self.fail_arm {
            return Err(TimerError::Rejected("simulated failure".to_string()));
        }
        let mut armed = self.armed.lock().unwrap();
        let handle = TimerHandle {
            id: timer_id(STATS_TIMER_ID + armed.len() as u64),
            period,
            kind,
            owner,
        };
        armed.push(handle.clone());
        self.live.lock().unwrap().insert(handle.id);
        Ok(handle)
    }

    fn exists(&self, id: TimerId) -> bool {
        self.live.lock().unwrap().contains(&id)
    }

    fn acknowledge_expiry(&self, id: TimerId) {
        self.acked.lock().unwrap().push(id);
    }

    fn cancel(&self, id: TimerId) {
        self.live.lock().unwrap().remove(&id);
        self.cancelled.lock().unwrap().push(id);
    }
}

/// Counts reads and flags any overlapping read.
#[derive(Default)]
pub struct CountingStats {
    reads: AtomicU32,
    in_read: AtomicBool,
    overlapped: AtomicBool,
}

impl CountingStats {
    pub fn reads(&self) -> u32 {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn overlapped(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }
}

impl StatisticsReader for CountingStats {
    fn read_statistics(&self) {
        if self.in_read.swap(true, Ordering::SeqCst) {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.in_read.store(false, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct MockStatusServer {
    pub fail_start: bool,
    pub started: Mutex<Vec<ServiceIdentity>>,
    pub stops: AtomicU32,
}

impl MockStatusServer {
    pub fn failing() -> Self {
        Self {
            fail_start: true,
            ..Self::default()
        }
    }

    pub fn started(&self) -> Vec<ServiceIdentity> {
        self.started.lock().unwrap().clone()
    }

    pub fn stops(&self) -> u32 {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusServer for MockStatusServer {
    async fn start(&self, identity: &ServiceIdentity) -> Result<(), ServiceError> {
        if self.fail_start {
            return Err(ServiceError::StatusServer("simulated bind failure".to_string()));
        }
        self.started.lock().unwrap().push(identity.clone());
        Ok(())
    }

    async fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}
