use anyhow::{Context, Result};
use crudcheck_core::{sequences, HarnessConfig, ScenarioRunner};
use crudcheck_monitoring::{LogExt, MonitoringConfig};
use std::process::ExitCode;
use tracing::info;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let monitoring_config = MonitoringConfig::from_env("crudcheck");
    crudcheck_monitoring::init(&monitoring_config).context("Failed to initialize logging")?;

    // Resolved once, shared read-only by both sequences
    let config = HarnessConfig::load()
        .log_err("Invalid configuration")
        .context("Failed to load configuration")?;
    info!(base_url = %config.base_url, db_url = %config.db_url, "Starting harness");

    let runner = ScenarioRunner::from_config(&config).context("Failed to build runner")?;
    let integration = sequences::integration().context("Invalid integration sequence")?;
    let smoke = sequences::smoke().context("Invalid smoke sequence")?;

    // The sequences share no state, only configuration
    let (integration_report, smoke_report) =
        tokio::join!(runner.run(&integration), runner.run(&smoke));

    let mut all_passed = true;
    for report in [&integration_report, &smoke_report] {
        print!("{}", report);
        all_passed &= report.passed();
    }

    if all_passed {
        info!("All sequences passed");
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
