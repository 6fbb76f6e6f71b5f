//! Structured logging using tracing.
//!
//! Console output is pretty or JSON; an optional file layer always writes JSON
//! with daily rotation.

use anyhow::Context;
use std::path::Path;
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer, Registry};

use crate::{LogFormat, MonitoringConfig};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize structured logging
pub fn init_logging(config: &MonitoringConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .with_context(|| format!("Invalid log filter '{}'", config.log_filter))?;

    let mut layers: Vec<BoxedLayer> = Vec::new();

    let console: BoxedLayer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
    };
    layers.push(console);

    if let Some(log_file) = &config.log_file {
        let directory = log_file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let file_name = log_file
            .file_name()
            .context("LOG_FILE must name a file")?;

        let file_appender = RollingFileAppender::new(Rotation::DAILY, directory, file_name);
        let file_layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_ansi(false)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(file_appender)
            .boxed();
        layers.push(file_layer);
    }

    let subscriber = tracing_subscriber::registry().with(layers).with(env_filter);

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set global default subscriber")?;

    info!(
        service_name = %config.service_name,
        log_format = ?config.log_format,
        log_file = ?config.log_file,
        "Logging initialized"
    );
    if let Some(format) = &config.rejected_format {
        warn!("Invalid LOG_FORMAT value: {}, using pretty", format);
    }

    Ok(())
}

/// Trait to add log context to results
pub trait LogExt<T, E> {
    /// Log error with additional context before returning
    fn log_err(self, message: &str) -> Result<T, E>;
}

impl<T, E: std::fmt::Display> LogExt<T, E> for Result<T, E> {
    fn log_err(self, message: &str) -> Result<T, E> {
        if let Err(ref e) = self {
            tracing::error!("{}: {}", message, e);
        }
        self
    }
}
