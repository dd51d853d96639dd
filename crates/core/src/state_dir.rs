//! Location of client-side state (credentials, logs)

use std::path::PathBuf;

/// Environment variable overriding the state directory
pub const STATE_DIR_ENV: &str = "DASHBOARD_STATE_DIR";

/// Directory holding credentials and log files.
///
/// `$DASHBOARD_STATE_DIR` wins, then the platform data directory, then the
/// working directory.
pub fn default_state_dir() -> PathBuf {
    std::env::var(STATE_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("dashboard")
        })
}
