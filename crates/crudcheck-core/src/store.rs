//! Read-only access to the `items` table
//!
//! Every lookup opens its own connection and closes it before returning, on
//! success and on error alike. Nothing here writes.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgRow};
use sqlx::{ConnectOptions, Connection, PgConnection, Row};
use tracing::{debug, instrument, warn};

use crate::config::HarnessConfig;
use crate::error::{HarnessError, HarnessResult};
use crate::model::ItemRow;

/// Point lookup of a full row by primary key
pub const FIND_ITEM_SQL: &str = "SELECT id, name, description FROM items WHERE id = $1";

/// Existence check by primary key
pub const ITEM_EXISTS_SQL: &str = "SELECT id FROM items WHERE id = $1";

/// Point lookups against the backing store
#[async_trait]
pub trait ItemLookup: Send + Sync {
    /// Fetch the row with the given id, if any
    async fn find_item(&self, id: i64) -> HarnessResult<Option<ItemRow>>;

    /// Whether a row with the given id exists
    async fn item_exists(&self, id: i64) -> HarnessResult<bool>;
}

/// PostgreSQL-backed lookups with one scoped connection per call
#[derive(Debug, Clone)]
pub struct PostgresItemStore {
    options: PgConnectOptions,
}

impl PostgresItemStore {
    /// Build from the harness configuration. No connection is opened here.
    pub fn from_config(config: &HarnessConfig) -> HarnessResult<Self> {
        let options = PgConnectOptions::from_str(&config.postgres_url())
            .map_err(|e| HarnessError::Configuration(format!("Invalid database URL: {}", e)))?
            .username(&config.db_user)
            .password(&config.db_password)
            .disable_statement_logging();

        Ok(Self { options })
    }

    /// Open a connection, run one parameterised query, close the connection.
    ///
    /// The close happens whether or not the query succeeded; a query error
    /// takes precedence over a close error.
    async fn fetch_optional(&self, sql: &'static str, id: i64) -> HarnessResult<Option<PgRow>> {
        let key = i32::try_from(id).map_err(|_| {
            HarnessError::MalformedResponse(format!("Identifier {} does not fit the id column", id))
        })?;

        let mut conn = PgConnection::connect_with(&self.options).await?;
        debug!("Opened scoped database connection");

        let result = sqlx::query(sql).bind(key).fetch_optional(&mut conn).await;

        let closed = conn.close().await;
        if let Err(ref e) = closed {
            warn!("Failed to close database connection cleanly: {}", e);
        }

        let row = result?;
        closed?;
        Ok(row)
    }
}

#[async_trait]
impl ItemLookup for PostgresItemStore {
    #[instrument(skip(self))]
    async fn find_item(&self, id: i64) -> HarnessResult<Option<ItemRow>> {
        let Some(row) = self.fetch_optional(FIND_ITEM_SQL, id).await? else {
            return Ok(None);
        };

        let id: i32 = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        let description: Option<String> = row.try_get("description")?;

        Ok(Some(ItemRow {
            id: i64::from(id),
            name,
            description: description.unwrap_or_default(),
        }))
    }

    #[instrument(skip(self))]
    async fn item_exists(&self, id: i64) -> HarnessResult<bool> {
        Ok(self.fetch_optional(ITEM_EXISTS_SQL, id).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_from_default_config() {
        let store = PostgresItemStore::from_config(&HarnessConfig::default()).unwrap();
        assert_eq!(store.options.get_host(), "db");
        assert_eq!(store.options.get_port(), 5432);
        assert_eq!(store.options.get_database(), Some("fastapidb"));
        assert_eq!(store.options.get_username(), "fastapi");
    }

    #[test]
    fn test_store_rejects_garbage_url() {
        let config = HarnessConfig {
            db_url: "postgres://[::1".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            PostgresItemStore::from_config(&config),
            Err(HarnessError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_oversized_identifier_is_rejected_before_connecting() {
        let store = PostgresItemStore::from_config(&HarnessConfig::default()).unwrap();
        let result = store.item_exists(i64::from(i32::MAX) + 1).await;
        assert!(matches!(result, Err(HarnessError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_unreachable_database_is_an_infrastructure_error() {
        let config = HarnessConfig {
            db_url: "postgres://127.0.0.1:9/items".to_string(),
            ..Default::default()
        };
        let store = PostgresItemStore::from_config(&config).unwrap();

        let result = store.find_item(1).await;
        assert!(matches!(result, Err(HarnessError::Database(_))));
    }
}
