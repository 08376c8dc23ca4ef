//! StorageActor - Persists region summaries
//!
//! ## Architecture
//!
//! The actor subscribes to the coordinator's summary broadcast and owns a list
//! of backends, typically a structured store followed by a log store. Every
//! flush writes the same batch to all of them concurrently; a failing backend
//! is logged and does not affect the others.
//!
//! ## Batching Strategy
//!
//! - **Size trigger**: Flush after 100 summaries
//! - **Time trigger**: Flush after 5 seconds
//!
//! Queries go to the first backend (the primary).

use std::time::Duration;

use futures::future::join_all;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time;
use tracing::{debug, error, instrument, trace, warn};

use crate::storage::{StorageBackend, UpdateRow};

use super::messages::{StorageCommand, StorageStats, SummaryEvent};

/// Batch size trigger - flush after this many rows
const BATCH_SIZE_TRIGGER: usize = 100;

/// Batch time trigger - flush after this duration
const BATCH_TIME_TRIGGER: Duration = Duration::from_secs(5);

pub struct StorageActor {
    /// Backends in priority order
    backends: Vec<Box<dyn StorageBackend>>,

    /// Rows waiting to be flushed
    batch_buffer: Vec<UpdateRow>,

    /// Command receiver
    command_rx: mpsc::Receiver<StorageCommand>,

    /// Summary receiver (broadcast subscription)
    summary_rx: broadcast::Receiver<SummaryEvent>,

    total_updates: u64,
    flush_count: u64,
    failed_writes: u64,
}

impl StorageActor {
    pub fn new(
        command_rx: mpsc::Receiver<StorageCommand>,
        summary_rx: broadcast::Receiver<SummaryEvent>,
        backends: Vec<Box<dyn StorageBackend>>,
    ) -> Self {
        debug!(
            "creating storage actor with backends: {:?}",
            backends.iter().map(|b| b.name()).collect::<Vec<_>>()
        );

        Self {
            backends,
            batch_buffer: Vec::with_capacity(BATCH_SIZE_TRIGGER),
            command_rx,
            summary_rx,
            total_updates: 0,
            flush_count: 0,
            failed_writes: 0,
        }
    }

    /// Run the actor's main loop
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        debug!("starting storage actor");

        self.check_backends().await;

        // First tick one period from now, not immediately
        let mut flush_interval =
            time::interval_at(time::Instant::now() + BATCH_TIME_TRIGGER, BATCH_TIME_TRIGGER);

        loop {
            // Pending summaries are taken before commands, so a Flush or
            // Shutdown sees everything published before it was sent
            tokio::select! {
                biased;

                result = self.summary_rx.recv() => {
                    match result {
                        Ok(event) => {
                            self.store_summary(&event).await;
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!("storage actor lagged, skipped {skipped} summaries");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            warn!("summary channel closed, shutting down");
                            break;
                        }
                    }
                }

                _ = flush_interval.tick() => {
                    if !self.batch_buffer.is_empty() {
                        trace!("time-based flush triggered ({} rows)", self.batch_buffer.len());
                        self.flush_batch().await;
                    }
                }

                Some(cmd) = self.command_rx.recv() => {
                    if !self.handle_command(cmd).await {
                        break;
                    }
                }

                else => {
                    warn!("command channel closed, shutting down");
                    break;
                }
            }
        }

        if !self.batch_buffer.is_empty() {
            debug!(
                "final flush before shutdown ({} rows)",
                self.batch_buffer.len()
            );
            self.flush_batch().await;
        }

        for backend in &self.backends {
            match backend.get_stats().await {
                Ok(stats) => debug!("{stats}"),
                Err(e) => warn!("failed to read {} backend stats: {}", backend.name(), e),
            }
            if let Err(e) = backend.close().await {
                error!("error closing {} backend: {}", backend.name(), e);
            }
        }

        debug!("storage actor stopped");
    }

    /// Log the health of every backend; unhealthy backends stay in use
    async fn check_backends(&self) {
        for backend in &self.backends {
            match backend.health_check().await {
                Ok(status) if status.healthy => {
                    debug!("{} backend healthy: {}", backend.name(), status.message);
                }
                Ok(status) => warn!("{} backend unhealthy: {}", backend.name(), status.message),
                Err(e) => error!("{} backend health check failed: {}", backend.name(), e),
            }
        }
    }

    async fn store_summary(&mut self, event: &SummaryEvent) {
        trace!(
            "storing summary for {} in {}",
            event.update.device_id, event.region
        );

        self.total_updates += 1;
        self.batch_buffer.push(UpdateRow::from_event(event));

        if self.batch_buffer.len() >= BATCH_SIZE_TRIGGER {
            trace!(
                "size-based flush triggered ({} rows)",
                self.batch_buffer.len()
            );
            self.flush_batch().await;
        }
    }

    /// Write the batch buffer to every backend
    ///
    /// Rows are dropped after the attempt even if a backend failed.
    async fn flush_batch(&mut self) {
        if self.batch_buffer.is_empty() {
            return;
        }

        let batch: Vec<UpdateRow> = self.batch_buffer.drain(..).collect();
        debug!("flushing {} rows to {} backends", batch.len(), self.backends.len());

        let writes = self
            .backends
            .iter()
            .map(|backend| backend.insert_batch(batch.clone()));

        for (backend, result) in self.backends.iter().zip(join_all(writes).await) {
            if let Err(e) = result {
                self.failed_writes += 1;
                error!("failed to flush batch to {} backend: {}", backend.name(), e);
            }
        }

        self.flush_count += 1;
        trace!("flush #{} complete", self.flush_count);
    }

    /// Handle a command; returns `false` when the actor should stop
    async fn handle_command(&mut self, cmd: StorageCommand) -> bool {
        match cmd {
            StorageCommand::Flush { respond_to } => {
                debug!("manual flush requested");
                self.flush_batch().await;
                let _ = respond_to.send(Ok(()));
            }

            StorageCommand::GetStats { respond_to } => {
                let _ = respond_to.send(StorageStats {
                    total_updates: self.total_updates,
                    buffer_size: self.batch_buffer.len(),
                    flush_count: self.flush_count,
                    failed_writes: self.failed_writes,
                });
            }

            StorageCommand::QueryLatest {
                region,
                limit,
                respond_to,
            } => {
                let result = match self.backends.first() {
                    Some(backend) => backend
                        .query_latest(&region, limit)
                        .await
                        .map_err(Into::into),
                    None => Err(anyhow::anyhow!("no storage backend configured")),
                };
                let _ = respond_to.send(result);
            }

            StorageCommand::Shutdown => {
                debug!("received shutdown command");
                return false;
            }
        }

        true
    }
}

/// Handle for controlling the StorageActor
#[derive(Clone, Debug)]
pub struct StorageHandle {
    sender: mpsc::Sender<StorageCommand>,
}

impl StorageHandle {
    /// Spawn a storage actor writing to `backends`
    pub fn spawn(
        summary_rx: broadcast::Receiver<SummaryEvent>,
        backends: Vec<Box<dyn StorageBackend>>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let actor = StorageActor::new(cmd_rx, summary_rx, backends);

        tokio::spawn(actor.run());

        Self { sender: cmd_tx }
    }

    /// Manually flush the write buffer
    pub async fn flush(&self) -> anyhow::Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(StorageCommand::Flush { respond_to: tx })
            .await?;

        rx.await??;
        Ok(())
    }

    /// Get storage statistics
    pub async fn get_stats(&self) -> Option<StorageStats> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(StorageCommand::GetStats { respond_to: tx })
            .await
            .ok()?;

        rx.await.ok()
    }

    /// Query the latest rows of a region from the primary backend
    pub async fn query_latest(
        &self,
        region: impl Into<String>,
        limit: usize,
    ) -> anyhow::Result<Vec<UpdateRow>> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(StorageCommand::QueryLatest {
                region: region.into(),
                limit,
                respond_to: tx,
            })
            .await?;

        rx.await?
    }

    /// Flush pending rows and stop the actor
    pub async fn shutdown(&self) {
        let _ = self.sender.send(StorageCommand::Shutdown).await;
    }
}
