//! Message types for actor communication
//!
//! This module defines all message types used for communication between actors.
//!
//! ## Design Principles
//!
//! 1. **Commands**: Messages sent to one specific actor via mpsc
//! 2. **Events**: Broadcast notifications published to every egress actor
//! 3. **Request/Response**: Queries carry a oneshot sender for the reply

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::oneshot;

use crate::DeviceUpdate;
use crate::storage::schema::UpdateRow;

/// Event published by the coordinator when a region worker finished a reading
///
/// Broadcast to all egress actors (ForwarderActor, StorageActor). Slow
/// subscribers may lag and skip summaries; they log how many were skipped.
#[derive(Debug, Clone)]
pub struct SummaryEvent {
    /// Region the reading was routed to
    pub region: String,

    /// The finished summary
    pub update: DeviceUpdate,

    /// When the coordinator received the summary
    pub timestamp: DateTime<Utc>,
}

/// Commands accepted by the CoordinatorActor
#[derive(Debug)]
pub enum CoordinatorCommand {
    /// Raw device event from ingress; routed to the worker of `region`
    IncomingEvent {
        device_id: String,
        region: String,
        payload: serde_json::Value,
    },

    /// Summary emitted by a region worker
    RegionSummary { region: String, update: DeviceUpdate },

    /// Get registry statistics
    GetStats {
        respond_to: oneshot::Sender<CoordinatorStats>,
    },

    /// List the known regions (sorted)
    ListRegions {
        respond_to: oneshot::Sender<Vec<String>>,
    },

    /// Ask the worker of `region` for its statistics
    ///
    /// Replies `None` if no worker exists for the region.
    WorkerStats {
        region: String,
        respond_to: oneshot::Sender<Option<WorkerStats>>,
    },

    /// Stop every region worker, then the coordinator itself
    Shutdown,
}

/// Commands accepted by a RegionWorker
#[derive(Debug)]
pub enum WorkerCommand {
    /// Process one device event
    Process {
        device_id: String,
        payload: serde_json::Value,
    },

    GetStats {
        respond_to: oneshot::Sender<WorkerStats>,
    },

    /// Stop after the events queued before this command; acknowledged once
    /// their summaries have been sent to the coordinator
    Shutdown { respond_to: oneshot::Sender<()> },
}

/// Coordinator registry statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct CoordinatorStats {
    /// Number of regions with a worker (equals the number of workers ever created)
    pub regions: usize,

    /// Names of those regions, sorted
    pub region_names: Vec<String>,

    /// Configured registry capacity, if any
    pub max_regions: Option<usize>,
}

/// Statistics for one region worker
#[derive(Debug, Clone, Serialize)]
pub struct WorkerStats {
    pub region: String,

    /// Number of readings processed since the worker was created
    pub processed: u64,
}

/// Commands that can be sent to the ForwarderActor
#[derive(Debug)]
pub enum ForwarderCommand {
    /// Forward a summary immediately and report the outcome
    ///
    /// Used for testing and manual re-sends.
    ForwardNow {
        event: SummaryEvent,
        respond_to: oneshot::Sender<anyhow::Result<()>>,
    },

    GetStats {
        respond_to: oneshot::Sender<ForwarderStats>,
    },

    /// Gracefully shut down the forwarder
    Shutdown,
}

/// Forwarder statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct ForwarderStats {
    /// Summaries accepted by the remote endpoint
    pub sent: u64,

    /// Summaries that failed (network error or non-success status)
    pub failed: u64,
}

/// Commands that can be sent to the StorageActor
#[derive(Debug)]
pub enum StorageCommand {
    /// Manually flush write buffer to storage
    Flush {
        respond_to: oneshot::Sender<anyhow::Result<()>>,
    },

    /// Get storage statistics
    GetStats {
        respond_to: oneshot::Sender<StorageStats>,
    },

    /// Query the most recent updates of a region from the primary backend
    QueryLatest {
        region: String,
        limit: usize,
        respond_to: oneshot::Sender<anyhow::Result<Vec<UpdateRow>>>,
    },

    /// Flush pending rows, close the backends and stop
    Shutdown,
}

/// Storage statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct StorageStats {
    /// Total summaries received from the coordinator
    pub total_updates: u64,

    /// Number of rows waiting in the write buffer
    pub buffer_size: usize,

    /// Number of flush operations performed
    pub flush_count: u64,

    /// Number of backend writes that failed
    pub failed_writes: u64,
}
