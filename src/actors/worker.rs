//! RegionWorker - Derives soil and crop summaries for one region
//!
//! ## Message Flow
//!
//! ```text
//! Coordinator → Process → extract reading → classify + recommend → RegionSummary → Coordinator
//! ```
//!
//! A worker is bound to one region for its whole life. It keeps no memory of
//! earlier readings; the only state is a processed counter for statistics.
//! Messages are handled one at a time in arrival order.

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument, trace, warn};

use crate::analysis;

use super::messages::{CoordinatorCommand, WorkerCommand, WorkerStats};

/// Actor processing the device events of a single region
pub struct RegionWorker {
    /// Region this worker is bound to
    region: String,

    /// Command receiver (unbounded so the coordinator never waits on a worker)
    command_rx: mpsc::UnboundedReceiver<WorkerCommand>,

    /// Coordinator that created this worker
    ///
    /// Weak, so workers do not keep the coordinator's inbox open.
    coordinator: mpsc::WeakUnboundedSender<CoordinatorCommand>,

    /// Readings processed so far
    processed: u64,
}

impl RegionWorker {
    pub fn new(
        region: String,
        command_rx: mpsc::UnboundedReceiver<WorkerCommand>,
        coordinator: mpsc::WeakUnboundedSender<CoordinatorCommand>,
    ) -> Self {
        Self {
            region,
            command_rx,
            coordinator,
            processed: 0,
        }
    }

    /// Run the worker's main loop
    ///
    /// Runs until a Shutdown command arrives, the command channel closes, or
    /// the coordinator is gone.
    #[instrument(skip(self), fields(region = %self.region))]
    pub async fn run(mut self) {
        debug!("starting region worker");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                WorkerCommand::Process { device_id, payload } => {
                    if !self.process(device_id, &payload) {
                        warn!("coordinator is gone, stopping worker");
                        break;
                    }
                }

                WorkerCommand::GetStats { respond_to } => {
                    let _ = respond_to.send(WorkerStats {
                        region: self.region.clone(),
                        processed: self.processed,
                    });
                }

                WorkerCommand::Shutdown { respond_to } => {
                    debug!("received shutdown command");
                    let _ = respond_to.send(());
                    break;
                }
            }
        }

        debug!("region worker stopped");
    }

    /// Summarize one reading and report it to the coordinator
    ///
    /// Returns `false` if the coordinator can no longer be reached.
    fn process(&mut self, device_id: String, payload: &serde_json::Value) -> bool {
        let update = analysis::summarize(device_id, payload);
        self.processed += 1;

        trace!(
            "processed reading #{} from {}",
            self.processed, update.device_id
        );

        let Some(coordinator) = self.coordinator.upgrade() else {
            return false;
        };

        coordinator
            .send(CoordinatorCommand::RegionSummary {
                region: self.region.clone(),
                update,
            })
            .is_ok()
    }
}

/// Handle for addressing a RegionWorker
#[derive(Clone, Debug)]
pub struct WorkerHandle {
    sender: mpsc::UnboundedSender<WorkerCommand>,

    /// Region served by the worker
    pub region: String,
}

impl WorkerHandle {
    /// Spawn a new worker for `region` reporting to `coordinator`
    pub fn spawn(
        region: String,
        coordinator: mpsc::WeakUnboundedSender<CoordinatorCommand>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        let worker = RegionWorker::new(region.clone(), cmd_rx, coordinator);

        tokio::spawn(worker.run());

        Self {
            sender: cmd_tx,
            region,
        }
    }

    /// Hand a device event to the worker (never waits)
    pub fn process(&self, device_id: String, payload: serde_json::Value) -> Result<()> {
        self.sender
            .send(WorkerCommand::Process { device_id, payload })
            .map_err(|_| anyhow::anyhow!("region worker {} has stopped", self.region))
    }

    /// Request statistics; the reply arrives on `respond_to`
    pub fn request_stats(&self, respond_to: oneshot::Sender<WorkerStats>) -> Result<()> {
        self.sender
            .send(WorkerCommand::GetStats { respond_to })
            .map_err(|_| anyhow::anyhow!("region worker {} has stopped", self.region))
    }

    /// Get statistics from the worker
    pub async fn stats(&self) -> Result<WorkerStats> {
        let (tx, rx) = oneshot::channel();
        self.request_stats(tx)?;
        rx.await.context("failed to receive worker stats")
    }

    /// Ask the worker to stop once its queued events are processed
    ///
    /// The returned receiver resolves when the worker has stopped; it errors
    /// if the worker was already gone.
    pub fn stop(&self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self.sender.send(WorkerCommand::Shutdown { respond_to: tx });
        rx
    }

    pub fn shutdown(&self) {
        let _ = self.stop();
    }
}
