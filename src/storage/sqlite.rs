//! SQLite storage backend implementation
//!
//! This module provides a SQLite-based implementation of the `Storage` trait.
//!
//! ## Connection Lifecycle
//!
//! No connection is held between writes. Every `save` opens the database file,
//! inserts one row and closes the connection again, so nothing keeps the file
//! locked while the engine sleeps between cycles. Write throughput is low, which
//! is fine for a handful of metrics every few seconds.
//!
//! ## Schema
//!
//! The `metrics` table is created on construction if it does not exist yet
//! (see [`super::schema`]). Constructing the backend twice against the same file
//! is harmless.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::Connection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteJournalMode};
use tracing::{debug, error, info, instrument};

use super::backend::Storage;
use super::error::{StorageError, StorageResult};
use super::schema::{CREATE_METRICS_TABLE, INSERT_METRIC, MetricRow};
use crate::Metric;

/// SQLite storage backend
pub struct SqliteStorage {
    options: SqliteConnectOptions,
    db_path: String,
}

impl SqliteStorage {
    /// Create a new SQLite backend
    ///
    /// This will:
    /// 1. Create the database file if it doesn't exist
    /// 2. Create the `metrics` table if it doesn't exist
    ///
    /// ## Example
    ///
    /// ```no_run
    /// # use vigil::storage::sqlite::SqliteStorage;
    /// # async fn example() -> anyhow::Result<()> {
    /// let storage = SqliteStorage::new("./history.db").await?;
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip_all)]
    pub async fn new(db_path: impl AsRef<Path>) -> StorageResult<Self> {
        let db_path_str = db_path.as_ref().to_string_lossy().to_string();

        info!("initializing SQLite storage at: {}", db_path_str);

        let options = SqliteConnectOptions::new()
            .filename(&db_path_str)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Delete)
            .busy_timeout(Duration::from_secs(30)); // Retry on lock contention

        let storage = Self {
            options,
            db_path: db_path_str,
        };
        storage.init_schema().await?;

        Ok(storage)
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    async fn connect(&self) -> StorageResult<SqliteConnection> {
        SqliteConnection::connect_with(&self.options)
            .await
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))
    }

    async fn init_schema(&self) -> StorageResult<()> {
        let mut conn = self.connect().await?;

        sqlx::query(CREATE_METRICS_TABLE)
            .execute(&mut conn)
            .await
            .map_err(|e| StorageError::SchemaFailed(e.to_string()))?;

        conn.close().await?;
        debug!("metrics table ready");
        Ok(())
    }

    /// Insert one metric, reporting failures to the caller
    #[instrument(skip(self, metric), fields(metric = %metric.name))]
    pub async fn insert(&self, metric: &Metric) -> StorageResult<()> {
        let row = MetricRow::from_metric(metric)?;

        let mut conn = self.connect().await?;

        sqlx::query(INSERT_METRIC)
            .bind(row.timestamp)
            .bind(&row.name)
            .bind(row.value)
            .bind(&row.tags)
            .execute(&mut conn)
            .await
            .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        conn.close().await?;

        debug!("stored metric");
        Ok(())
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn save(&self, metric: &Metric) {
        if let Err(e) = self.insert(metric).await {
            error!("Error saving to SQLite: {e}");
        }
    }
}
