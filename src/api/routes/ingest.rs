//! Device alert ingress

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde_json::Value;
use tracing::{debug, error, instrument};

use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
    types::IngestResponse,
};

/// Extract a required string field from the alert body
fn required_str<'a>(body: &'a Value, field: &str) -> ApiResult<&'a str> {
    body.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::InvalidRequest(format!("missing string field `{field}`")))
}

/// POST /alert
///
/// Accepts `{device_id, edge_node, anomaly_result}` and hands the whole body to
/// the coordinator. The reply does not depend on the downstream outcome.
#[instrument(skip_all)]
pub async fn receive_alert(
    State(state): State<ApiState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<IngestResponse>> {
    let Json(body) = body?;

    if !body.is_object() {
        return Err(ApiError::InvalidRequest(
            "alert body must be a JSON object".to_string(),
        ));
    }

    let device_id = required_str(&body, "device_id")?.to_string();
    let region = required_str(&body, "edge_node")?.to_string();

    debug!("alert from {device_id} via {region}");

    if let Err(e) = state.coordinator.incoming_event(device_id, region, body) {
        error!("failed to submit alert to coordinator: {e:#}");
    }

    Ok(Json(IngestResponse::received()))
}
