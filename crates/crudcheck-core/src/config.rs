//! Configuration for the harness
//!
//! Endpoints and credentials come from the environment with hard-coded
//! fallbacks. The configuration is resolved once and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, warn};

use crate::error::{HarnessError, HarnessResult};

/// Environment variable naming the API base URL
pub const BASE_URL_VAR: &str = "BASE_URL";
/// Environment variable naming the database URL
pub const DB_URL_VAR: &str = "DB_URL";
/// Environment variable naming the database user
pub const DB_USER_VAR: &str = "DB_USER";
/// Environment variable naming the database password
pub const DB_PASS_VAR: &str = "DB_PASS";

/// Harness configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Base URL of the items service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Database URL, JDBC (`jdbc:postgresql://...`) or native (`postgres://...`)
    #[serde(default = "default_db_url")]
    pub db_url: String,

    /// Database user
    #[serde(default = "default_db_user")]
    pub db_user: String,

    /// Database password
    #[serde(default = "default_db_password", skip_serializing)]
    pub db_password: String,
}

fn default_base_url() -> String {
    "http://fastapi_app:8000".to_string()
}

fn default_db_url() -> String {
    "jdbc:postgresql://db:5432/fastapidb".to_string()
}

fn default_db_user() -> String {
    "fastapi".to_string()
}

fn default_db_password() -> String {
    "fastapi".to_string()
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            db_url: default_db_url(),
            db_user: default_db_user(),
            db_password: default_db_password(),
        }
    }
}

impl HarnessConfig {
    /// Load configuration from environment variables
    pub fn load() -> HarnessResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Unset keys fall back to the defaults. Keys that are set but blank are
    /// treated as unset.
    pub fn from_lookup<F>(lookup: F) -> HarnessResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(base_url) = value(BASE_URL_VAR) {
            config.base_url = base_url;
        }

        if let Some(db_url) = value(DB_URL_VAR) {
            config.db_url = db_url;
        }

        if let Some(db_user) = value(DB_USER_VAR) {
            config.db_user = db_user;
        }

        if let Some(db_password) = value(DB_PASS_VAR) {
            config.db_password = db_password;
        }

        config.validate()?;

        debug!(
            base_url = %config.base_url,
            db_url = %config.db_url,
            "Harness configuration resolved"
        );
        Ok(config)
    }

    /// Check that the configuration is usable
    pub fn validate(&self) -> HarnessResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(HarnessError::Configuration(format!(
                "{} must be an http(s) URL, got '{}'",
                BASE_URL_VAR, self.base_url
            )));
        }

        let db_url = self.postgres_url();
        if !(db_url.starts_with("postgres://") || db_url.starts_with("postgresql://")) {
            return Err(HarnessError::Configuration(format!(
                "{} must be a PostgreSQL URL, got '{}'",
                DB_URL_VAR, self.db_url
            )));
        }

        if self.db_password.is_empty() {
            warn!("Database password is empty");
        }

        Ok(())
    }

    /// Database URL in the form the PostgreSQL driver understands.
    ///
    /// `jdbc:postgresql://db:5432/fastapidb` becomes `postgresql://db:5432/fastapidb`.
    pub fn postgres_url(&self) -> String {
        self.db_url
            .strip_prefix("jdbc:")
            .unwrap_or(&self.db_url)
            .to_string()
    }
}
