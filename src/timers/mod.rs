// ============================================================================
// Timer Subsystem
// ============================================================================
//
// Contract between tasks and whatever schedules their timers. A task arms a
// timer, receives `Message::TimerExpired` on its own queue when it fires, and
// owes the subsystem an acknowledgement for every expiry of a known timer.
// Periodic timers are only re-armed after that acknowledgement.
//
// ============================================================================

mod tokio_timers;

use std::fmt;
use std::num::NonZeroU64;
use std::time::Duration;

use crate::error::TimerError;
use crate::tasks::TaskId;

pub use tokio_timers::TokioTimerService;

/// Identifier of an armed timer. Zero is never a valid id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(NonZeroU64);

impl TimerId {
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    OneShot,
    Periodic,
}

/// An armed timer and its metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerHandle {
    pub id: TimerId,
    pub period: Duration,
    pub kind: TimerKind,
    pub owner: TaskId,
}

pub trait TimerService: Send + Sync {
    /// Schedule a timer whose expiries are delivered to `owner`.
    fn arm(&self, owner: TaskId, period: Duration, kind: TimerKind) -> Result<TimerHandle, TimerError>;

    /// Whether `id` is currently live.
    fn exists(&self, id: TimerId) -> bool;

    /// Acknowledge one expiry of `id`. Re-arms periodic timers, retires one-shots.
    fn acknowledge_expiry(&self, id: TimerId);

    /// Remove `id`. Cancelling an unknown or already removed timer is a no-op.
    fn cancel(&self, id: TimerId);
}
