//! Storage backend trait definition
//!
//! This module defines the core `StorageBackend` trait that every
//! summary store implements.

use std::collections::HashMap;

use async_trait::async_trait;

use super::error::StorageResult;
use super::schema::UpdateRow;

/// Health status of the storage backend
#[derive(Debug, Clone)]
pub struct HealthStatus {
    /// Is the backend operational?
    pub healthy: bool,

    /// Human-readable status message
    pub message: String,

    /// Additional backend-specific metadata
    pub metadata: HashMap<String, String>,
}

/// Trait for summary stores
///
/// Implemented by the structured stores (SQLite, in-memory) and the log
/// store. The StorageActor owns the backends and calls them from its own
/// task, never from the coordinator.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync` as they are moved into the actor task.
///
/// ## Error Handling
///
/// Methods return `StorageResult<T>`; implementations convert their own
/// errors into `StorageError` variants.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Short backend name used in logs
    fn name(&self) -> &'static str;

    /// Insert a batch of rows
    ///
    /// This is the primary write method. Implementations should write the
    /// batch atomically where the medium allows it.
    async fn insert_batch(&self, rows: Vec<UpdateRow>) -> StorageResult<()>;

    /// Get the `limit` most recent rows of a region, oldest first
    async fn query_latest(&self, region: &str, limit: usize) -> StorageResult<Vec<UpdateRow>>;

    /// Check backend health
    ///
    /// Performs a lightweight operation to verify the backend is operational.
    async fn health_check(&self) -> StorageResult<HealthStatus>;

    /// Human-readable statistics (e.g. "SQLite: 1200 rows, 0.45 MB on disk")
    async fn get_stats(&self) -> StorageResult<String>;

    /// Close the backend and release resources
    async fn close(&self) -> StorageResult<()>;
}
