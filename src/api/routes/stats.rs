//! Region registry statistics endpoint

use axum::{Json, extract::State};

use crate::api::{error::ApiResult, state::ApiState, types::StatsResponse};

/// GET /api/v1/stats
///
/// Returns the number of known regions and their names, read in one snapshot
pub async fn get_stats(State(state): State<ApiState>) -> ApiResult<Json<StatsResponse>> {
    let stats = state.coordinator.stats().await?;

    Ok(Json(StatsResponse {
        regions: stats.regions,
        region_names: stats.region_names,
        max_regions: stats.max_regions,
    }))
}
