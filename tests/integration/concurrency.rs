//! Concurrency and race condition tests
//!
//! These tests verify:
//! - Concurrent first events for one region create exactly one worker
//! - Many handles feeding the coordinator at once
//! - Per-region ordering of summaries

use futures::future::join_all;
use serde_json::json;

use crate::helpers::*;

#[tokio::test]
async fn test_concurrent_first_events_create_one_worker() {
    const EVENTS: usize = 50;

    let pipeline = spawn_pipeline(None);

    let tasks = (0..EVENTS).map(|i| {
        let coordinator = pipeline.coordinator.clone();
        tokio::spawn(async move {
            coordinator
                .incoming_event(format!("device_{i}"), "edge-europe", json!({}))
                .unwrap();
        })
    });
    for result in join_all(tasks).await {
        result.unwrap();
    }

    let processed = wait_for(|| async {
        let stats = pipeline
            .coordinator
            .worker_stats("edge-europe")
            .await
            .ok()??;
        (stats.processed == EVENTS as u64).then_some(stats.processed)
    })
    .await;

    assert_eq!(processed, EVENTS as u64);
    assert_eq!(pipeline.coordinator.stats().await.unwrap().regions, 1);

    pipeline.coordinator.shutdown();
}

#[tokio::test]
async fn test_concurrent_regions() {
    let pipeline = spawn_pipeline(None);
    let mut summaries = pipeline.summary_tx.subscribe();

    let tasks = (0..10).map(|i| {
        let coordinator = pipeline.coordinator.clone();
        tokio::spawn(async move {
            for j in 0..5 {
                coordinator
                    .incoming_event(format!("device_{j}"), format!("edge-{i}"), json!({}))
                    .unwrap();
            }
        })
    });
    join_all(tasks).await;

    for _ in 0..50 {
        next_summary(&mut summaries).await;
    }

    let stats = pipeline.coordinator.stats().await.unwrap();
    assert_eq!(stats.regions, 10);

    pipeline.coordinator.shutdown();
}

#[tokio::test]
async fn test_region_summaries_keep_submission_order() {
    let pipeline = spawn_pipeline(None);
    let mut summaries = pipeline.summary_tx.subscribe();

    for i in 0..20 {
        pipeline
            .coordinator
            .incoming_event(format!("device_{i}"), "edge-europe", json!({}))
            .unwrap();
    }

    for i in 0..20 {
        let event = next_summary(&mut summaries).await;
        assert_eq!(event.update.device_id, format!("device_{i}"));
    }

    pipeline.coordinator.shutdown();
}
