// Crudcheck E2E Tests
//
// These tests talk to a deployed items service and its PostgreSQL database,
// located through BASE_URL, DB_URL, DB_USER and DB_PASS. They are ignored by
// default; run them with `--ignored` once the deployment is up.

/// Shared setup for the live tests
pub mod utils {
    use anyhow::{Context, Result};
    use crudcheck_core::scenario::runner::DEFAULT_HEADERS;
    use crudcheck_core::{HarnessConfig, RequestFactory, ScenarioRunner};

    /// Configuration from the environment, with the usual defaults
    pub fn live_config() -> Result<HarnessConfig> {
        HarnessConfig::load().context("Invalid harness configuration")
    }

    /// Runner wired to the live service and database
    pub fn live_runner() -> Result<ScenarioRunner> {
        let config = live_config()?;
        ScenarioRunner::from_config(&config).context("Failed to build runner")
    }

    /// Request factory for ad-hoc calls outside a sequence
    pub fn live_factory() -> Result<RequestFactory> {
        let config = live_config()?;
        RequestFactory::new(config.base_url, DEFAULT_HEADERS)
            .context("Failed to build request factory")
    }
}
