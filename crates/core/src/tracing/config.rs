//! Configuration for tracing and instrumentation
//!
//! This module provides configuration types for setting up the tracing
//! subscriber used by the dashboard binaries.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Main instrumentation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentationConfig {
    /// Service name for tracing
    pub service_name: String,
    /// Log level filter (e.g., "info", "debug", "dashboard_http=trace")
    pub log_level: String,
    /// Line format on stderr
    #[serde(default)]
    pub format: LogFormat,
    /// Optional file that receives a copy of every log line (no ANSI colors)
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for InstrumentationConfig {
    fn default() -> Self {
        Self {
            service_name: "dashboard".to_string(),
            log_level: "info".to_string(),
            format: LogFormat::Pretty,
            log_file: None,
        }
    }
}

impl InstrumentationConfig {
    /// Filter directive used when `RUST_LOG` is not set
    pub fn default_directive(&self) -> String {
        let level = &self.log_level;
        if level.contains('=') {
            level.clone()
        } else {
            format!("dashboard={level},dashboard_core={level},dashboard_http={level}")
        }
    }
}
