//! Integration tests for the full actor pipeline
//!
//! These tests verify that actors work correctly together:
//! - Coordinator → Worker → Coordinator → broadcast
//! - Several regions served by distinct workers
//! - Graceful shutdown of the whole system

use crop_surveillance::{Crop, Level, PhClass};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::helpers::*;

#[tokio::test]
async fn test_event_flows_to_summary() {
    let pipeline = spawn_pipeline(None);
    let mut summaries = pipeline.summary_tx.subscribe();

    let alert = create_alert("device_germany", "edge-europe", 90.0, 45.0, 40.0, 6.5);
    pipeline
        .coordinator
        .incoming_event("device_germany", "edge-europe", alert)
        .unwrap();

    let event = next_summary(&mut summaries).await;
    assert_eq!(event.region, "edge-europe");
    assert_eq!(event.update.device_id, "device_germany");
    assert_eq!(event.update.soil.n_level, Level::Medium);
    assert_eq!(event.update.soil.p_level, Level::Medium);
    assert_eq!(event.update.soil.k_level, Level::Medium);
    assert_eq!(event.update.soil.ph_class, PhClass::Neutral);

    let crops: Vec<(Crop, f64)> = event
        .update
        .crops
        .iter()
        .map(|suggestion| (suggestion.crop, suggestion.score))
        .collect();
    assert_eq!(
        crops,
        vec![(Crop::Wheat, 1.0), (Crop::Rice, 1.0), (Crop::Corn, 1.0)]
    );

    pipeline.coordinator.shutdown();
}

#[tokio::test]
async fn test_regions_get_separate_workers() {
    let pipeline = spawn_pipeline(None);
    let mut summaries = pipeline.summary_tx.subscribe();

    for (device, region) in [
        ("device_germany", "edge-europe"),
        ("device_india", "edge-asia"),
        ("device_france", "edge-europe"),
        ("device_kenya", "edge-africa"),
    ] {
        pipeline
            .coordinator
            .incoming_event(device, region, json!({ "anomaly_result": {} }))
            .unwrap();
    }

    for _ in 0..4 {
        next_summary(&mut summaries).await;
    }

    assert_eq!(
        pipeline.coordinator.regions().await.unwrap(),
        vec!["edge-africa", "edge-asia", "edge-europe"]
    );

    let europe = pipeline
        .coordinator
        .worker_stats("edge-europe")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(europe.processed, 2);

    pipeline.coordinator.shutdown();
}

#[tokio::test]
async fn test_missing_readings_use_defaults() {
    let pipeline = spawn_pipeline(None);
    let mut summaries = pipeline.summary_tx.subscribe();

    pipeline
        .coordinator
        .incoming_event("device_a", "edge-x", json!({ "anomaly_result": {} }))
        .unwrap();
    pipeline
        .coordinator
        .incoming_event(
            "device_b",
            "edge-x",
            json!({ "anomaly_result": { "N": 50, "P": 50, "K": 50, "ph": 7 } }),
        )
        .unwrap();

    let defaulted = next_summary(&mut summaries).await;
    let explicit = next_summary(&mut summaries).await;

    assert_eq!(defaulted.update.soil, explicit.update.soil);
    assert_eq!(defaulted.update.crops, explicit.update.crops);
    assert_eq!(defaulted.update.crops[0].crop, Crop::Rice);

    pipeline.coordinator.shutdown();
}

#[tokio::test]
async fn test_graceful_shutdown() {
    let pipeline = spawn_pipeline(None);

    pipeline
        .coordinator
        .incoming_event("device_a", "edge-x", json!({}))
        .unwrap();
    pipeline.coordinator.shutdown();

    let result = tokio::time::timeout(std::time::Duration::from_secs(1), pipeline.task)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());

    assert!(
        pipeline
            .coordinator
            .incoming_event("device_a", "edge-x", json!({}))
            .is_err()
    );
}
