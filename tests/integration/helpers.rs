//! Helper functions for integration tests

use std::future::Future;
use std::time::Duration;

use crop_surveillance::actors::{
    coordinator::{CoordinatorConfig, CoordinatorError, CoordinatorHandle},
    messages::SummaryEvent,
};
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

pub struct TestPipeline {
    pub coordinator: CoordinatorHandle,
    pub task: JoinHandle<Result<(), CoordinatorError>>,
    pub summary_tx: broadcast::Sender<SummaryEvent>,
}

/// Spawn a coordinator with a fresh summary channel
pub fn spawn_pipeline(max_regions: Option<usize>) -> TestPipeline {
    let (summary_tx, _) = broadcast::channel(256);
    let (coordinator, task) =
        CoordinatorHandle::spawn(CoordinatorConfig { max_regions }, summary_tx.clone());

    TestPipeline {
        coordinator,
        task,
        summary_tx,
    }
}

/// Alert body as sent by an edge node
pub fn create_alert(device_id: &str, region: &str, n: f64, p: f64, k: f64, ph: f64) -> Value {
    json!({
        "device_id": device_id,
        "edge_node": region,
        "anomaly_result": { "N": n, "P": p, "K": k, "ph": ph }
    })
}

/// Receive the next summary or fail after one second
pub async fn next_summary(rx: &mut broadcast::Receiver<SummaryEvent>) -> SummaryEvent {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for summary")
        .expect("summary channel closed")
}

/// Poll `check` until it yields a value or two seconds pass
pub async fn wait_for<T, F, Fut>(mut check: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if let Some(value) = check().await {
                return value;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time")
}
