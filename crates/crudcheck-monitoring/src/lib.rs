//! Logging setup for the crudcheck harness.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

pub mod logging;

pub use logging::{init_logging, LogExt};

/// Output format of the console log layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-line output
    #[default]
    Pretty,
    /// One JSON object per event, for log aggregation
    Json,
}

/// Configuration for initializing logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Service name attached to the startup event
    pub service_name: String,
    /// Log level filter (e.g., "info,crudcheck=debug"); `RUST_LOG` wins when set
    pub log_filter: String,
    /// Console output format
    pub log_format: LogFormat,
    /// Optional file receiving JSON logs with daily rotation
    pub log_file: Option<PathBuf>,
    /// `LOG_FORMAT` value that was not understood; reported once logging is up
    #[serde(skip)]
    pub rejected_format: Option<String>,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            service_name: "crudcheck".to_string(),
            log_filter: "info,crudcheck=debug".to_string(),
            log_format: LogFormat::Pretty,
            log_file: None,
            rejected_format: None,
        }
    }
}

impl MonitoringConfig {
    /// Read `LOG_FILTER`, `LOG_FORMAT` and `LOG_FILE`, keeping defaults for unset keys
    pub fn from_env(service_name: impl Into<String>) -> Self {
        Self::from_lookup(service_name, |key| env::var(key).ok())
    }

    pub fn from_lookup<F>(service_name: impl Into<String>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            service_name: service_name.into(),
            ..Default::default()
        };

        if let Some(filter) = lookup("LOG_FILTER") {
            config.log_filter = filter;
        }

        if let Some(format) = lookup("LOG_FORMAT") {
            config.log_format = match format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                _ => {
                    config.rejected_format = Some(format);
                    LogFormat::Pretty
                }
            };
        }

        if let Some(file) = lookup("LOG_FILE").filter(|f| !f.is_empty()) {
            config.log_file = Some(PathBuf::from(file));
        }

        config
    }
}

/// Initialize logging for a harness process
pub fn init(config: &MonitoringConfig) -> anyhow::Result<()> {
    init_logging(config)
}
