use serde::{Deserialize, Serialize};

use crate::health::ApplicationHealth;

/// Identity of the module hosting the service tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceIdentity {
    pub name: String,
    pub version: String,
}

impl ServiceIdentity {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Case-insensitive comparison against a package name
    pub fn is_package(&self, package: &str) -> bool {
        self.name.eq_ignore_ascii_case(package)
    }
}

/// Lifecycle state reported while the status server is answering requests
pub const SERVICE_STATE_ALIVE: &str = "ALIVE";

/// Body of `GET /info`
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub state: &'static str,
    pub health: ApplicationHealth,
    pub start_time_secs: i64,
}
