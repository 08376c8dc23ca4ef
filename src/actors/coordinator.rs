//! CoordinatorActor - Routes device events to per-region workers
//!
//! ## Message Flow
//!
//! ```text
//! Ingress → IncomingEvent → [registry lookup / spawn worker] → Process → RegionWorker
//!                                                                           │
//! Egress actors ← broadcast SummaryEvent ← RegionSummary ←──────────────────┘
//! ```
//!
//! ## Registry
//!
//! The region → worker registry is owned by the actor's loop and never shared,
//! so two racing first events for the same region are handled one after the
//! other and only one worker is created. Entries are never removed; without a
//! configured `max_regions` the registry grows with every new region.
//!
//! Every send made from the loop is non-blocking: worker inboxes are unbounded
//! and summaries go out on a broadcast channel.

use std::collections::HashMap;
use std::fmt;

use anyhow::{Context, Result};
use chrono::Utc;
use futures::future::join_all;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::DeviceUpdate;

use super::messages::{CoordinatorCommand, CoordinatorStats, SummaryEvent, WorkerStats};
use super::worker::WorkerHandle;

/// Fatal coordinator failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    /// A new region arrived but no further worker can be created
    RegionCapacityExhausted { region: String, capacity: usize },
}

impl fmt::Display for CoordinatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinatorError::RegionCapacityExhausted { region, capacity } => write!(
                f,
                "cannot create worker for region {}: registry capacity of {} regions exhausted",
                region, capacity
            ),
        }
    }
}

impl std::error::Error for CoordinatorError {}

/// Coordinator settings
#[derive(Debug, Clone, Default)]
pub struct CoordinatorConfig {
    /// Maximum number of region workers (`None` = unbounded)
    pub max_regions: Option<usize>,
}

/// Process-wide entry point owning the region registry
pub struct CoordinatorActor {
    /// Region → worker
    registry: HashMap<String, WorkerHandle>,

    /// Command receiver
    command_rx: mpsc::UnboundedReceiver<CoordinatorCommand>,

    /// Handed to new workers so they can report back
    self_tx: mpsc::WeakUnboundedSender<CoordinatorCommand>,

    /// Broadcast sender for finished summaries
    summary_tx: broadcast::Sender<SummaryEvent>,

    config: CoordinatorConfig,
}

impl CoordinatorActor {
    pub fn new(
        config: CoordinatorConfig,
        command_rx: mpsc::UnboundedReceiver<CoordinatorCommand>,
        self_tx: mpsc::WeakUnboundedSender<CoordinatorCommand>,
        summary_tx: broadcast::Sender<SummaryEvent>,
    ) -> Self {
        Self {
            registry: HashMap::new(),
            command_rx,
            self_tx,
            summary_tx,
            config,
        }
    }

    /// Run the coordinator's main loop
    ///
    /// Runs until a Shutdown command is received or every handle is dropped.
    /// Summaries of events routed before that point are still published.
    /// Returns an error only when a worker for a new region cannot be created.
    #[instrument(skip(self))]
    pub async fn run(mut self) -> Result<(), CoordinatorError> {
        debug!("starting coordinator");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                CoordinatorCommand::IncomingEvent {
                    device_id,
                    region,
                    payload,
                } => {
                    if let Err(e) = self.route(device_id, region, payload) {
                        error!("{e}");
                        self.stop_workers();
                        return Err(e);
                    }
                }

                CoordinatorCommand::RegionSummary { region, update } => {
                    self.publish(region, update);
                }

                CoordinatorCommand::GetStats { respond_to } => {
                    let _ = respond_to.send(CoordinatorStats {
                        regions: self.registry.len(),
                        region_names: self.region_names(),
                        max_regions: self.config.max_regions,
                    });
                }

                CoordinatorCommand::ListRegions { respond_to } => {
                    let _ = respond_to.send(self.region_names());
                }

                CoordinatorCommand::WorkerStats { region, respond_to } => {
                    self.worker_stats(&region, respond_to);
                }

                CoordinatorCommand::Shutdown => {
                    debug!("received shutdown command");
                    break;
                }
            }
        }

        self.drain().await;
        debug!("coordinator stopped");
        Ok(())
    }

    fn region_names(&self) -> Vec<String> {
        let mut regions: Vec<String> = self.registry.keys().cloned().collect();
        regions.sort();
        regions
    }

    /// Stop every worker, then publish the summaries they sent before stopping
    ///
    /// Commands other than summaries that are still queued are dropped.
    async fn drain(&mut self) {
        debug!("draining {} region workers", self.registry.len());

        let stopped: Vec<_> = self.registry.values().map(WorkerHandle::stop).collect();
        join_all(stopped).await;

        while let Ok(cmd) = self.command_rx.try_recv() {
            match cmd {
                CoordinatorCommand::RegionSummary { region, update } => {
                    self.publish(region, update);
                }
                other => trace!("dropping command after shutdown: {other:?}"),
            }
        }
    }

    /// Resolve (or create) the worker of `region` and hand it the event
    fn route(
        &mut self,
        device_id: String,
        region: String,
        payload: serde_json::Value,
    ) -> Result<(), CoordinatorError> {
        if !self.registry.contains_key(&region) {
            if let Some(capacity) = self.config.max_regions
                && self.registry.len() >= capacity
            {
                return Err(CoordinatorError::RegionCapacityExhausted { region, capacity });
            }

            info!("first event for region {region}, creating worker");
            let worker = WorkerHandle::spawn(region.clone(), self.self_tx.clone());
            self.registry.insert(region.clone(), worker);
        }

        if let Some(worker) = self.registry.get(&region) {
            trace!("routing event from {device_id} to region {region}");
            if let Err(e) = worker.process(device_id, payload) {
                error!("failed to route event: {e:#}");
            }
        }

        Ok(())
    }

    /// Hand a finished summary to the egress actors
    fn publish(&self, region: String, update: DeviceUpdate) {
        info!(
            "summary for {} in {}: soil [{}], best crop {}",
            update.device_id,
            region,
            update.soil,
            update
                .crops
                .first()
                .map(|c| c.crop.to_string())
                .unwrap_or_default()
        );

        let event = SummaryEvent {
            region,
            update,
            timestamp: Utc::now(),
        };

        // Send errors only mean that no egress actor is subscribed
        match self.summary_tx.send(event) {
            Ok(num_receivers) => {
                trace!("published summary to {num_receivers} receivers");
            }
            Err(_) => {
                trace!("no receivers for summary event (this is OK)");
            }
        }
    }

    fn worker_stats(&self, region: &str, respond_to: oneshot::Sender<Option<WorkerStats>>) {
        let Some(worker) = self.registry.get(region) else {
            let _ = respond_to.send(None);
            return;
        };

        let (tx, rx) = oneshot::channel();
        if worker.request_stats(tx).is_err() {
            warn!("worker for region {region} has stopped");
            let _ = respond_to.send(None);
            return;
        }

        // Await the reply off the coordinator loop
        tokio::spawn(async move {
            let _ = respond_to.send(rx.await.ok());
        });
    }

    fn stop_workers(&mut self) {
        debug!("stopping {} region workers", self.registry.len());
        for worker in self.registry.values() {
            worker.shutdown();
        }
    }
}

/// Handle for sending events and queries to the CoordinatorActor
///
/// Cheap to clone; shared by ingress handlers.
#[derive(Clone, Debug)]
pub struct CoordinatorHandle {
    sender: mpsc::UnboundedSender<CoordinatorCommand>,
}

impl CoordinatorHandle {
    /// Spawn the coordinator
    ///
    /// Returns the handle and the task running the actor. The task resolves to
    /// an error if the coordinator had to give up on a region.
    pub fn spawn(
        config: CoordinatorConfig,
        summary_tx: broadcast::Sender<SummaryEvent>,
    ) -> (Self, JoinHandle<Result<(), CoordinatorError>>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        let actor = CoordinatorActor::new(config, cmd_rx, cmd_tx.downgrade(), summary_tx);

        let task = tokio::spawn(actor.run());

        (Self { sender: cmd_tx }, task)
    }

    /// Submit a device event (fire-and-forget, never waits)
    ///
    /// Fails only if the coordinator has stopped.
    pub fn incoming_event(
        &self,
        device_id: impl Into<String>,
        region: impl Into<String>,
        payload: serde_json::Value,
    ) -> Result<()> {
        self.sender
            .send(CoordinatorCommand::IncomingEvent {
                device_id: device_id.into(),
                region: region.into(),
                payload,
            })
            .map_err(|_| anyhow::anyhow!("coordinator has stopped"))
    }

    pub async fn stats(&self) -> Result<CoordinatorStats> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(CoordinatorCommand::GetStats { respond_to: tx })
            .map_err(|_| anyhow::anyhow!("failed to send GetStats command"))?;

        rx.await.context("failed to receive coordinator stats")
    }

    /// Known regions, sorted
    pub async fn regions(&self) -> Result<Vec<String>> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(CoordinatorCommand::ListRegions { respond_to: tx })
            .map_err(|_| anyhow::anyhow!("failed to send ListRegions command"))?;

        rx.await.context("failed to receive region list")
    }

    /// Statistics of the worker serving `region`, `None` if the region is unknown
    pub async fn worker_stats(&self, region: impl Into<String>) -> Result<Option<WorkerStats>> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(CoordinatorCommand::WorkerStats {
                region: region.into(),
                respond_to: tx,
            })
            .map_err(|_| anyhow::anyhow!("failed to send WorkerStats command"))?;

        rx.await.context("failed to receive worker stats")
    }

    /// Stop all workers and the coordinator
    pub fn shutdown(&self) {
        let _ = self.sender.send(CoordinatorCommand::Shutdown);
    }
}
