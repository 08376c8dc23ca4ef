//! Storage backends for summary persistence
//!
//! This module provides a trait-based abstraction for the egress stores
//! that receive finished region summaries.
//!
//! ## Design
//!
//! - **Trait-based**: `StorageBackend` trait allows swapping implementations
//! - **Async**: All operations are async for compatibility with Tokio actors
//! - **Batch-oriented**: Rows are written in batches by the StorageActor
//!
//! ## Backends
//!
//! - **SQLite** (default): Structured store, one row per summary
//! - **Log store**: One JSON document per summary in a directory
//! - **In-Memory**: No persistence, for testing or forward-only deployments
//!
//! ## Usage
//!
//! ```no_run
//! use crop_surveillance::storage::{StorageBackend, sqlite::SqliteBackend};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = SqliteBackend::new("./updates.db").await?;
//!     // Use with StorageActor
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod error;
pub mod log;
pub mod memory;
pub mod schema;
#[cfg(feature = "storage-sqlite")]
pub mod sqlite;

pub use backend::{HealthStatus, StorageBackend};
pub use error::{StorageError, StorageResult};
pub use schema::{LogDocument, UpdateRow};
