//! In-memory storage backend (no persistence)
//!
//! This backend stores rows in a ring buffer per region.
//! It's useful for:
//! - Testing without database dependencies
//! - Deployments that only forward summaries
//!
//! ## Limitations
//!
//! - **No persistence**: All data lost on restart
//! - **Limited capacity**: Ring buffer size is fixed per region

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::backend::{HealthStatus, StorageBackend};
use super::error::StorageResult;
use super::schema::UpdateRow;

/// Maximum rows to keep in memory per region
pub const MAX_ROWS_PER_REGION: usize = 1000;

/// In-memory storage backend
///
/// When a region's buffer is full, its oldest rows are evicted.
pub struct MemoryBackend {
    /// Rows grouped by region
    rows: RwLock<HashMap<String, VecDeque<UpdateRow>>>,

    capacity: usize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_capacity(MAX_ROWS_PER_REGION)
    }

    /// Create a backend keeping at most `capacity` rows per region
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn insert_batch(&self, rows: Vec<UpdateRow>) -> StorageResult<()> {
        debug!("inserting {} rows into memory", rows.len());

        let mut stored = self.rows.write().await;
        for row in rows {
            let buffer = stored.entry(row.region.clone()).or_default();
            buffer.push_back(row);
            if buffer.len() > self.capacity {
                buffer.pop_front();
            }
        }

        Ok(())
    }

    async fn query_latest(&self, region: &str, limit: usize) -> StorageResult<Vec<UpdateRow>> {
        debug!("querying latest {} rows for {}", limit, region);

        let stored = self.rows.read().await;
        let rows = stored
            .get(region)
            .map(|buffer| {
                let skip = buffer.len().saturating_sub(limit);
                buffer.iter().skip(skip).cloned().collect()
            })
            .unwrap_or_default();

        Ok(rows)
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        let total: usize = self.rows.read().await.values().map(VecDeque::len).sum();

        Ok(HealthStatus {
            healthy: true,
            message: "In-memory storage operational".to_string(),
            metadata: HashMap::from([
                ("backend".to_string(), "memory".to_string()),
                ("total_rows".to_string(), total.to_string()),
            ]),
        })
    }

    async fn get_stats(&self) -> StorageResult<String> {
        let stored = self.rows.read().await;
        let total: usize = stored.values().map(VecDeque::len).sum();

        Ok(format!(
            "In-Memory: {} rows across {} regions",
            total,
            stored.len()
        ))
    }

    async fn close(&self) -> StorageResult<()> {
        debug!("closing in-memory backend (no-op)");
        Ok(())
    }
}
