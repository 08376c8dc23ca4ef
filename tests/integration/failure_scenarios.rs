//! Failure scenario tests
//!
//! These tests verify the pipeline keeps running when egress fails:
//! - Forward target returning errors
//! - Forward target unreachable
//! - Forward target hanging past the request timeout
//! - Region capacity exhaustion is fatal

use assert_matches::assert_matches;
use crop_surveillance::actors::{coordinator::CoordinatorError, forwarder::ForwarderHandle};
use crop_surveillance::config::ForwardConfig;
use serde_json::json;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

#[tokio::test]
async fn test_forward_errors_do_not_stop_coordinator() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let pipeline = spawn_pipeline(None);
    let mut summaries = pipeline.summary_tx.subscribe();
    let forwarder = ForwarderHandle::spawn(
        ForwardConfig {
            url: mock_server.uri(),
            timeout_secs: 2,
        },
        pipeline.summary_tx.subscribe(),
    )
    .unwrap();

    for i in 0..3 {
        let device = format!("device_{i}");
        pipeline
            .coordinator
            .incoming_event(&device, "edge-europe", create_alert(&device, "edge-europe", 60.0, 40.0, 50.0, 7.0))
            .unwrap();
        next_summary(&mut summaries).await;
    }

    let failed = wait_for(|| async {
        let stats = forwarder.get_stats().await.ok()?;
        (stats.failed == 3).then_some(stats.failed)
    })
    .await;
    assert_eq!(failed, 3);

    // Still accepting and routing after every forward failed
    pipeline
        .coordinator
        .incoming_event("device_late", "edge-asia", json!({ "anomaly_result": {} }))
        .unwrap();
    let event = next_summary(&mut summaries).await;
    assert_eq!(event.region, "edge-asia");

    forwarder.shutdown().await.unwrap();
    pipeline.coordinator.shutdown();
}

#[tokio::test]
async fn test_unreachable_forward_target() {
    // Nothing listens on the discard port
    let forwarder_config = ForwardConfig {
        url: "http://127.0.0.1:9/summaries".to_string(),
        timeout_secs: 1,
    };

    let pipeline = spawn_pipeline(None);
    let mut summaries = pipeline.summary_tx.subscribe();
    let forwarder =
        ForwarderHandle::spawn(forwarder_config, pipeline.summary_tx.subscribe()).unwrap();

    pipeline
        .coordinator
        .incoming_event("device_a", "edge-x", json!({ "anomaly_result": {} }))
        .unwrap();
    let event = next_summary(&mut summaries).await;

    assert!(forwarder.forward_now(event).await.is_err());
    assert_eq!(pipeline.coordinator.stats().await.unwrap().regions, 1);

    pipeline.coordinator.shutdown();
}

async fn hanging_forward_target() -> MockServer {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;
    mock_server
}

#[tokio::test]
async fn test_forward_timeout_is_bounded() {
    let mock_server = hanging_forward_target().await;

    // Not subscribed to the pipeline, so only the explicit send reaches the target
    let (_summary_tx, summary_rx) = broadcast::channel(16);
    let forwarder = ForwarderHandle::spawn(
        ForwardConfig {
            url: mock_server.uri(),
            timeout_secs: 1,
        },
        summary_rx,
    )
    .unwrap();

    let pipeline = spawn_pipeline(None);
    let mut summaries = pipeline.summary_tx.subscribe();
    pipeline
        .coordinator
        .incoming_event("device_a", "edge-x", json!({ "anomaly_result": {} }))
        .unwrap();
    let event = next_summary(&mut summaries).await;

    let started = Instant::now();
    let result = tokio::time::timeout(Duration::from_secs(3), forwarder.forward_now(event))
        .await
        .expect("forward was not bounded by the client timeout");

    assert!(result.is_err());
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(forwarder.get_stats().await.unwrap().failed, 1);

    forwarder.shutdown().await.unwrap();
    pipeline.coordinator.shutdown();
}

#[tokio::test]
async fn test_slow_forward_target_does_not_gate_coordinator() {
    let mock_server = hanging_forward_target().await;

    let pipeline = spawn_pipeline(None);
    let mut summaries = pipeline.summary_tx.subscribe();
    let forwarder = ForwarderHandle::spawn(
        ForwardConfig {
            url: mock_server.uri(),
            timeout_secs: 1,
        },
        pipeline.summary_tx.subscribe(),
    )
    .unwrap();

    let started = Instant::now();
    for i in 0..20 {
        pipeline
            .coordinator
            .incoming_event(format!("device_{i}"), "edge-europe", json!({}))
            .unwrap();
    }
    for _ in 0..20 {
        next_summary(&mut summaries).await;
    }

    // All summaries are out while the first forward is still waiting
    assert!(started.elapsed() < Duration::from_secs(1));

    // Queries are answered while the forwarder works through its backlog
    let stats = tokio::time::timeout(Duration::from_millis(200), pipeline.coordinator.stats())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stats.regions, 1);

    drop(forwarder);
    pipeline.coordinator.shutdown();
}

#[tokio::test]
async fn test_region_capacity_exhaustion_is_fatal() {
    let pipeline = spawn_pipeline(Some(2));

    for region in ["edge-a", "edge-b", "edge-c"] {
        pipeline
            .coordinator
            .incoming_event("device", region, json!({}))
            .unwrap();
    }

    let result = tokio::time::timeout(std::time::Duration::from_secs(1), pipeline.task)
        .await
        .unwrap()
        .unwrap();

    assert_matches!(
        result,
        Err(CoordinatorError::RegionCapacityExhausted { region, capacity: 2 }) if region == "edge-c"
    );
}
