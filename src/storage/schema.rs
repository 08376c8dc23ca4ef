//! Stored record definitions
//!
//! ## Layout
//!
//! Each summary becomes one [`UpdateRow`], keyed by a random `event_id`.
//! Region and device are plain columns so they can be indexed and filtered;
//! the soil classification and crop ranking are kept as typed structs in
//! memory and serialized to JSON only when a backend writes them out.
//!
//! The log store wraps the row in a [`LogDocument`], one document per event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::actors::messages::SummaryEvent;
use crate::{CropSuggestion, SoilQuality};

/// A single persisted summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRow {
    /// Unique identifier of the record
    pub event_id: String,

    /// When the coordinator received the summary (always UTC)
    pub timestamp: DateTime<Utc>,

    /// Region (edge node) the device reported through
    pub region: String,

    pub device_id: String,

    pub soil: SoilQuality,

    /// Ranked crop suggestions, best first
    pub crops: Vec<CropSuggestion>,
}

impl UpdateRow {
    /// Create a row with a fresh event id
    pub fn from_event(event: &SummaryEvent) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            timestamp: event.timestamp,
            region: event.region.clone(),
            device_id: event.update.device_id.clone(),
            soil: event.update.soil.clone(),
            crops: event.update.crops.clone(),
        }
    }
}

/// Document written to the log store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogDocument {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub data: UpdateRow,
}

impl LogDocument {
    /// Object key of the document, relative to the log store root
    pub fn key(&self) -> String {
        format!("logs/{}.json", self.event_id)
    }
}

impl From<UpdateRow> for LogDocument {
    fn from(row: UpdateRow) -> Self {
        Self {
            event_id: row.event_id.clone(),
            timestamp: row.timestamp,
            data: row,
        }
    }
}
