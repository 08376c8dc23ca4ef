//! SQLite storage backend implementation
//!
//! This is the structured store: one row per summary in the `device_updates`
//! table, indexed by (region, timestamp).
//!
//! ## Features
//!
//! - **Embedded**: No separate database server required
//! - **WAL mode**: Better concurrency for reads during writes
//! - **Connection pooling**: Efficient resource usage
//! - **Migrations**: Automatic schema versioning with sqlx
//!
//! Soil classification and crop ranking are stored as JSON text columns.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Pool, Row, Sqlite};
use tracing::{debug, info, instrument, warn};

use super::backend::{HealthStatus, StorageBackend};
use super::error::{StorageError, StorageResult};
use super::schema::UpdateRow;

/// SQLite storage backend
pub struct SqliteBackend {
    pool: Pool<Sqlite>,
    db_path: String,
}

impl SqliteBackend {
    /// Create a new SQLite backend
    ///
    /// This will:
    /// 1. Create the database file if it doesn't exist
    /// 2. Run migrations to create tables
    /// 3. Configure SQLite for WAL mode
    ///
    /// ## Example
    ///
    /// ```no_run
    /// # use crop_surveillance::storage::sqlite::SqliteBackend;
    /// # async fn example() -> anyhow::Result<()> {
    /// let backend = SqliteBackend::new("./updates.db").await?;
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip_all)]
    pub async fn new(db_path: impl AsRef<Path>) -> StorageResult<Self> {
        let db_path_str = db_path.as_ref().to_string_lossy().to_string();

        info!("initializing SQLite backend at: {}", db_path_str);

        let options = SqliteConnectOptions::new()
            .filename(&db_path_str)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

        debug!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;

        info!("database migrations complete");

        Ok(Self {
            pool,
            db_path: db_path_str,
        })
    }

    fn timestamp_to_millis(dt: &DateTime<Utc>) -> i64 {
        dt.timestamp_millis()
    }

    fn millis_to_timestamp(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
    }

    fn row_to_update(row: SqliteRow) -> StorageResult<UpdateRow> {
        let soil: String = row.get("soil");
        let crops: String = row.get("crops");

        Ok(UpdateRow {
            event_id: row.get("event_id"),
            timestamp: Self::millis_to_timestamp(row.get("timestamp")),
            region: row.get("region"),
            device_id: row.get("device_id"),
            soil: serde_json::from_str(&soil).map_err(|e| {
                StorageError::SerializationError(format!("failed to deserialize soil: {}", e))
            })?,
            crops: serde_json::from_str(&crops).map_err(|e| {
                StorageError::SerializationError(format!("failed to deserialize crops: {}", e))
            })?,
        })
    }
}

#[async_trait]
impl StorageBackend for SqliteBackend {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    #[instrument(skip(self, rows), fields(count = rows.len()))]
    async fn insert_batch(&self, rows: Vec<UpdateRow>) -> StorageResult<()> {
        if rows.is_empty() {
            return Ok(());
        }

        debug!("inserting {} rows into SQLite", rows.len());

        let mut tx = self.pool.begin().await?;

        for row in rows {
            let soil_json = serde_json::to_string(&row.soil).map_err(|e| {
                StorageError::SerializationError(format!("failed to serialize soil: {}", e))
            })?;
            let crops_json = serde_json::to_string(&row.crops).map_err(|e| {
                StorageError::SerializationError(format!("failed to serialize crops: {}", e))
            })?;

            sqlx::query(
                r#"
                INSERT INTO device_updates (
                    event_id, timestamp, region, device_id, soil, crops
                )
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT (event_id) DO NOTHING
                "#,
            )
            .bind(&row.event_id)
            .bind(Self::timestamp_to_millis(&row.timestamp))
            .bind(&row.region)
            .bind(&row.device_id)
            .bind(soil_json)
            .bind(crops_json)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!("batch insert complete");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn query_latest(&self, region: &str, limit: usize) -> StorageResult<Vec<UpdateRow>> {
        debug!("querying latest {} rows for region {}", limit, region);

        let rows = sqlx::query(
            r#"
            SELECT event_id, timestamp, region, device_id, soil, crops
            FROM device_updates
            WHERE region = ?
            ORDER BY timestamp DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(region)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut results = rows
            .into_iter()
            .map(Self::row_to_update)
            .collect::<StorageResult<Vec<_>>>()?;

        // Oldest first
        results.reverse();
        debug!("query returned {} rows", results.len());
        Ok(results)
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> StorageResult<HealthStatus> {
        match sqlx::query("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => Ok(HealthStatus {
                healthy: true,
                message: "SQLite backend operational".to_string(),
                metadata: HashMap::from([
                    ("backend".to_string(), "sqlite".to_string()),
                    ("db_path".to_string(), self.db_path.clone()),
                ]),
            }),
            Err(e) => {
                warn!("health check failed: {}", e);
                Ok(HealthStatus {
                    healthy: false,
                    message: format!("health check failed: {}", e),
                    metadata: HashMap::new(),
                })
            }
        }
    }

    #[instrument(skip(self))]
    async fn get_stats(&self) -> StorageResult<String> {
        let (total_rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM device_updates")
            .fetch_one(&self.pool)
            .await?;

        let (regions,): (i64,) =
            sqlx::query_as("SELECT COUNT(DISTINCT region) FROM device_updates")
                .fetch_one(&self.pool)
                .await?;

        let file_size = std::fs::metadata(&self.db_path)
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(format!(
            "SQLite: {} rows, {} regions, {:.2} MB on disk",
            total_rows,
            regions,
            file_size as f64 / 1_000_000.0
        ))
    }

    async fn close(&self) -> StorageResult<()> {
        info!("closing SQLite backend");
        self.pool.close().await;
        Ok(())
    }
}
