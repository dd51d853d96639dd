//! Client configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment prefix for all dashboard settings, e.g. `DASHBOARD_API__BASE_URL`
pub const ENV_PREFIX: &str = "DASHBOARD";

/// Settings for [`ApiClient`](super::ApiClient)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the REST API, without the `/v1` prefix
    pub base_url: String,

    /// Request timeout in seconds; 0 disables the timeout
    pub timeout_secs: u64,

    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_secs: 10,
            user_agent: format!("dashboard-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
