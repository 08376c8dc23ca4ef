//! Integration tests for API endpoints
//!
//! These tests verify that:
//! - Alerts posted to the ingress reach the coordinator and storage
//! - Rejected bodies never reach the coordinator
//! - Stats and region endpoints reflect the registry
//! - Error handling is correct

use axum::http::StatusCode;
use crop_surveillance::{
    actors::storage::StorageHandle,
    api::{ApiConfig, ApiState, spawn_api_server},
    storage::memory::MemoryBackend,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::net::SocketAddr;

use crate::helpers::*;

// Spawn the ingress on a random port
async fn spawn_test_api(pipeline: &TestPipeline, storage: Option<StorageHandle>) -> SocketAddr {
    let config = ApiConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        enable_cors: true,
    };

    spawn_api_server(config, ApiState::new(pipeline.coordinator.clone(), storage))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let pipeline = spawn_pipeline(None);
    let addr = spawn_test_api(&pipeline, None).await;

    let response = reqwest::get(format!("http://{addr}/api/v1/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_alert_is_routed_and_stored() {
    let pipeline = spawn_pipeline(None);
    let storage = StorageHandle::spawn(
        pipeline.summary_tx.subscribe(),
        vec![Box::new(MemoryBackend::new())],
    );
    let addr = spawn_test_api(&pipeline, Some(storage.clone())).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/alert"))
        .json(&create_alert("device_germany", "edge-europe", 90.0, 45.0, 40.0, 6.5))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.json::<Value>().await.unwrap(),
        json!({ "status": "received" })
    );

    wait_for(|| async {
        let stats = storage.get_stats().await?;
        (stats.total_updates == 1).then_some(())
    })
    .await;
    storage.flush().await.unwrap();

    let body: Value = client
        .get(format!("http://{addr}/api/v1/regions/edge-europe/updates?limit=5"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["region"], "edge-europe");
    assert_eq!(body["updates"].as_array().unwrap().len(), 1);
    assert_eq!(body["updates"][0]["device_id"], "device_germany");
    assert_eq!(body["updates"][0]["soil"]["nLevel"], "Medium");
    assert_eq!(body["updates"][0]["crops"][0]["crop"], "Wheat");

    let region: Value = client
        .get(format!("http://{addr}/api/v1/regions/edge-europe"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(region, json!({ "region": "edge-europe", "processed": 1 }));

    storage.shutdown().await;
    pipeline.coordinator.shutdown();
}

#[tokio::test]
async fn test_invalid_alerts_are_rejected() {
    let pipeline = spawn_pipeline(None);
    let addr = spawn_test_api(&pipeline, None).await;
    let client = reqwest::Client::new();

    for body in [
        json!({ "edge_node": "edge-europe", "anomaly_result": {} }),
        json!({ "device_id": "device_germany", "anomaly_result": {} }),
        json!({ "device_id": 17, "edge_node": "edge-europe" }),
        json!("device_germany"),
    ] {
        let response = client
            .post(format!("http://{addr}/alert"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");

        let error: Value = response.json().await.unwrap();
        assert!(error["error"].is_string());
    }

    let response = client
        .post(format!("http://{addr}/alert"))
        .header("content-type", "application/json")
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(pipeline.coordinator.stats().await.unwrap().regions, 0);
    pipeline.coordinator.shutdown();
}

#[tokio::test]
async fn test_stats_endpoint() {
    let pipeline = spawn_pipeline(Some(10));
    let mut summaries = pipeline.summary_tx.subscribe();
    let addr = spawn_test_api(&pipeline, None).await;
    let client = reqwest::Client::new();

    for (device, region) in [("device_india", "edge-asia"), ("device_kenya", "edge-africa")] {
        client
            .post(format!("http://{addr}/alert"))
            .json(&json!({ "device_id": device, "edge_node": region, "anomaly_result": {} }))
            .send()
            .await
            .unwrap();
        next_summary(&mut summaries).await;
    }

    let body: Value = client
        .get(format!("http://{addr}/api/v1/stats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(
        body,
        json!({
            "regions": 2,
            "region_names": ["edge-africa", "edge-asia"],
            "max_regions": 10
        })
    );

    pipeline.coordinator.shutdown();
}

#[tokio::test]
async fn test_unknown_region_returns_404() {
    let pipeline = spawn_pipeline(None);
    let addr = spawn_test_api(&pipeline, None).await;

    let response = reqwest::get(format!("http://{addr}/api/v1/regions/edge-nowhere"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
