use anyhow::Result;
use dashboard_core::tracing::{InstrumentationConfig, init_tracing};
use std::path::Path;
use tracing::Level;

use crate::config::LogSettings;

/// Log file written inside the data directory when file logging is enabled
pub const LOG_FILE_NAME: &str = "dashboard.log";

/// Initialize logging for the CLI
///
/// `RUST_LOG` takes precedence over `level`.
pub fn init_logging(level: Level, settings: &LogSettings, data_dir: &Path) -> Result<()> {
    init_tracing(&instrumentation(level, settings, data_dir))
}

fn instrumentation(level: Level, settings: &LogSettings, data_dir: &Path) -> InstrumentationConfig {
    InstrumentationConfig {
        service_name: "dashboard".to_string(),
        log_level: level.as_str().to_lowercase(),
        format: settings.format,
        log_file: settings.file.then(|| data_dir.join(LOG_FILE_NAME)),
    }
}
