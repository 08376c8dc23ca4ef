//! API response types

use serde::{Deserialize, Serialize};

use crate::storage::UpdateRow;

/// Acknowledgement returned for every accepted alert
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestResponse {
    pub status: String,
}

impl IngestResponse {
    pub fn received() -> Self {
        Self {
            status: "received".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    /// Number of regions with a worker
    pub regions: usize,

    /// Region names, sorted
    pub region_names: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_regions: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionResponse {
    pub region: String,

    /// Readings processed by the region's worker
    pub processed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatesResponse {
    pub region: String,

    /// Stored summaries, oldest first
    pub updates: Vec<UpdateRow>,
}
