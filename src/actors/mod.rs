//! Actor-based event routing
//!
//! Each actor runs as an independent async task communicating via Tokio channels.
//!
//! ## Architecture Overview
//!
//! ```text
//!                  ┌──────────────────┐
//!   Ingress ──────▶│   Coordinator    │◀─────────────┐
//!  IncomingEvent   │ (region registry)│  RegionSummary│
//!                  └───┬──────────┬───┘              │
//!              Process │          │ Process          │
//!              ┌───────▼──┐   ┌───▼──────┐           │
//!              │ Worker   │   │ Worker   │───────────┘
//!              │ (region) │   │ (region) │
//!              └──────────┘   └──────────┘
//!                  Coordinator
//!                      │ publish
//!           ┌──────────▼─────────┐
//!           │ Broadcast Channel  │ (summaries)
//!           └─────┬──────────┬───┘
//!        ┌────────▼───┐ ┌────▼─────────┐
//!        │ Forwarder  │ │ StorageActor │
//!        └────────────┘ └──────────────┘
//! ```
//!
//! ## Actor Types
//!
//! - **CoordinatorActor**: Owns the region registry, spawns workers lazily
//! - **RegionWorker**: Classifies soil and ranks crops for one region
//! - **ForwarderActor**: Posts summaries to a remote endpoint
//! - **StorageActor**: Writes summaries to the structured and log stores
//!
//! ## Communication Patterns
//!
//! 1. **Commands**: Each actor has an mpsc command channel
//! 2. **Events**: Summaries go out on a broadcast channel for fan-out
//! 3. **Request/Response**: oneshot channels for queries

pub mod coordinator;
pub mod forwarder;
pub mod messages;
pub mod storage;
pub mod worker;
