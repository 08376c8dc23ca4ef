//! Per-region endpoints

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
    types::{RegionResponse, UpdatesResponse},
};

const DEFAULT_UPDATE_LIMIT: usize = 50;
const MAX_UPDATE_LIMIT: usize = 1000;

/// Query parameters for stored summaries
#[derive(Debug, Deserialize)]
pub struct UpdatesQuery {
    /// Max results (default: 50, capped at 1000)
    limit: Option<usize>,
}

/// GET /api/v1/regions/:region
///
/// Statistics of the worker serving the region
pub async fn get_region(
    State(state): State<ApiState>,
    Path(region): Path<String>,
) -> ApiResult<Json<RegionResponse>> {
    let stats = state
        .coordinator
        .worker_stats(region.clone())
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("unknown region: {region}")))?;

    Ok(Json(RegionResponse {
        region: stats.region,
        processed: stats.processed,
    }))
}

/// GET /api/v1/regions/:region/updates
///
/// Latest stored summaries of the region, oldest first
pub async fn get_region_updates(
    State(state): State<ApiState>,
    Path(region): Path<String>,
    Query(query): Query<UpdatesQuery>,
) -> ApiResult<Json<UpdatesResponse>> {
    let storage = state
        .storage
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("no storage backend configured".to_string()))?;

    let limit = query
        .limit
        .unwrap_or(DEFAULT_UPDATE_LIMIT)
        .min(MAX_UPDATE_LIMIT);

    let updates = storage
        .query_latest(region.clone(), limit)
        .await
        .map_err(|e| ApiError::StorageError(format!("{e:#}")))?;

    Ok(Json(UpdatesResponse { region, updates }))
}
