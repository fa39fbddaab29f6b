//! Service status and statistics task pair.
//!
//! Two bus-driven tasks bridge an in-process message bus to an external
//! status server and to a periodic statistics timer. See [`tasks::init`].

pub mod config;
pub mod error;
pub mod health;
pub mod metrics;
pub mod models;
pub mod tasks;
pub mod timers;

#[cfg(test)]
mod test_support;

pub use config::{Config, StatsSettings};
pub use error::{BusError, ServiceError, TimerError};
pub use health::{AppHealth, ApplicationHealth};
pub use models::ServiceIdentity;
