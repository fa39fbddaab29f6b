use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::models::ServiceIdentity;

// ============================================================================
// Configuration
// ============================================================================
//
// Defaults, optionally overlaid by a JSON file, then by environment variables.
//
// ============================================================================

/// Package whose host is the only one collecting periodic statistics
pub const DEFAULT_STATS_PACKAGE_NAME: &str = "MME";

/// Period of the statistics timer (EPC_STATS_TIMER_VALUE)
pub const DEFAULT_STATS_TIMER_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service_name: String,
    pub service_version: String,
    pub status_server_host: String,
    pub status_server_port: u16,
    pub stats_timer_secs: u64,
    pub stats_package_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_STATS_PACKAGE_NAME.to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            status_server_host: "0.0.0.0".to_string(),
            status_server_port: 9090,
            stats_timer_secs: DEFAULT_STATS_TIMER_SECS,
            stats_package_name: DEFAULT_STATS_PACKAGE_NAME.to_string(),
        }
    }
}

/// Statistics timer settings handed to the message-dispatch task
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSettings {
    pub package_name: String,
    pub period: Duration,
}

impl Default for StatsSettings {
    fn default() -> Self {
        Self {
            package_name: DEFAULT_STATS_PACKAGE_NAME.to_string(),
            period: Duration::from_secs(DEFAULT_STATS_TIMER_SECS),
        }
    }
}

impl Config {
    /// Load from an optional JSON file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(name) = lookup("SERVICE_NAME") {
            self.service_name = name;
        }
        if let Some(version) = lookup("SERVICE_VERSION") {
            self.service_version = version;
        }
        if let Some(host) = lookup("STATUS_SERVER_HOST") {
            self.status_server_host = host;
        }
        if let Some(port) = lookup("STATUS_SERVER_PORT") {
            self.status_server_port = port.parse().context("STATUS_SERVER_PORT")?;
        }
        if let Some(secs) = lookup("STATS_TIMER_SECS") {
            self.stats_timer_secs = secs.parse().context("STATS_TIMER_SECS")?;
        }
        if let Some(package) = lookup("STATS_PACKAGE_NAME") {
            self.stats_package_name = package;
        }
        Ok(())
    }

    pub fn identity(&self) -> ServiceIdentity {
        ServiceIdentity::new(&self.service_name, &self.service_version)
    }

    pub fn stats_settings(&self) -> StatsSettings {
        StatsSettings {
            package_name: self.stats_package_name.clone(),
            period: Duration::from_secs(self.stats_timer_secs),
        }
    }
}
