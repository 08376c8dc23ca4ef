//! Log store backend
//!
//! Writes every summary as its own JSON document below a root directory,
//! at `<root>/logs/<event_id>.json`. Documents are never rewritten.
//!
//! Queries scan the directory, so this backend is meant as an audit trail
//! next to a structured store rather than as the primary query source.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, instrument, warn};

use super::backend::{HealthStatus, StorageBackend};
use super::error::{StorageError, StorageResult};
use super::schema::{LogDocument, UpdateRow};

pub struct LogBackend {
    root: PathBuf,
}

impl LogBackend {
    /// Open (and create if needed) a log store rooted at `root`
    #[instrument(skip_all)]
    pub async fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();

        if fs::try_exists(&root).await? && !fs::metadata(&root).await?.is_dir() {
            return Err(StorageError::InvalidConfig(format!(
                "log store root {} is not a directory",
                root.display()
            )));
        }

        fs::create_dir_all(root.join("logs")).await?;
        debug!("log store ready at {}", root.display());

        Ok(Self { root })
    }

    fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    async fn read_documents(&self) -> StorageResult<Vec<LogDocument>> {
        let mut documents = Vec::new();
        let mut entries = fs::read_dir(self.logs_dir()).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            let content = fs::read(&path).await?;
            match serde_json::from_slice::<LogDocument>(&content) {
                Ok(doc) => documents.push(doc),
                Err(e) => warn!("skipping unreadable log document {}: {}", path.display(), e),
            }
        }

        Ok(documents)
    }
}

#[async_trait]
impl StorageBackend for LogBackend {
    fn name(&self) -> &'static str {
        "log"
    }

    #[instrument(skip(self, rows), fields(count = rows.len()))]
    async fn insert_batch(&self, rows: Vec<UpdateRow>) -> StorageResult<()> {
        for row in rows {
            let doc = LogDocument::from(row);
            let body = serde_json::to_vec(&doc)?;
            fs::write(self.root.join(doc.key()), body).await?;
        }

        Ok(())
    }

    async fn query_latest(&self, region: &str, limit: usize) -> StorageResult<Vec<UpdateRow>> {
        let mut rows: Vec<UpdateRow> = self
            .read_documents()
            .await?
            .into_iter()
            .map(|doc| doc.data)
            .filter(|row| row.region == region)
            .collect();

        rows.sort_by_key(|row| row.timestamp);
        let skip = rows.len().saturating_sub(limit);
        Ok(rows.split_off(skip))
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        let healthy = fs::metadata(self.logs_dir())
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);

        Ok(HealthStatus {
            healthy,
            message: if healthy {
                "Log store operational".to_string()
            } else {
                format!("log directory {} is missing", self.logs_dir().display())
            },
            metadata: HashMap::from([
                ("backend".to_string(), "log".to_string()),
                ("root".to_string(), self.root.display().to_string()),
            ]),
        })
    }

    async fn get_stats(&self) -> StorageResult<String> {
        let mut count = 0usize;
        let mut entries = fs::read_dir(self.logs_dir()).await?;
        while entries.next_entry().await?.is_some() {
            count += 1;
        }

        Ok(format!(
            "Log store: {} documents in {}",
            count,
            self.root.display()
        ))
    }

    async fn close(&self) -> StorageResult<()> {
        debug!("closing log store (no-op)");
        Ok(())
    }
}
