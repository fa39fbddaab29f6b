use serde::Serialize;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

// ============================================================================
// Application Health
// ============================================================================
//
// Process-wide health flag. Written by the message-dispatch task, read
// concurrently by the status server and the statistics reader without locks.
//
// ============================================================================

/// Health of the hosting application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ApplicationHealth {
    #[serde(rename = "APP_HEALTHY")]
    Healthy,
    #[serde(rename = "APP_UNHEALTHY")]
    Unhealthy,
}

impl ApplicationHealth {
    pub fn is_healthy(&self) -> bool {
        matches!(self, ApplicationHealth::Healthy)
    }

    fn to_raw(self) -> u8 {
        match self {
            ApplicationHealth::Unhealthy => 0,
            ApplicationHealth::Healthy => 1,
        }
    }

    fn from_raw(raw: u8) -> Self {
        if raw == 1 {
            ApplicationHealth::Healthy
        } else {
            ApplicationHealth::Unhealthy
        }
    }
}

/// Shared handle to the process-wide health value. Starts unhealthy.
#[derive(Debug, Clone)]
pub struct AppHealth {
    value: Arc<AtomicU8>,
}

impl AppHealth {
    pub fn new() -> Self {
        Self {
            value: Arc::new(AtomicU8::new(ApplicationHealth::Unhealthy.to_raw())),
        }
    }

    pub fn set(&self, health: ApplicationHealth) {
        let previous = ApplicationHealth::from_raw(self.value.swap(health.to_raw(), Ordering::AcqRel));
        if previous != health {
            tracing::info!(from = ?previous, to = ?health, "Application health changed");
        }
    }

    pub fn get(&self) -> ApplicationHealth {
        ApplicationHealth::from_raw(self.value.load(Ordering::Acquire))
    }
}

impl Default for AppHealth {
    fn default() -> Self {
        Self::new()
    }
}
