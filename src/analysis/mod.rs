//! Soil and crop analysis of nutrient readings
//!
//! Both analyses are pure functions over a [`NutrientReading`]. The region
//! workers call [`summarize`] for every device event they receive.

pub mod crops;
pub mod soil;

use serde_json::Value;

use crate::{DeviceUpdate, NutrientReading};

pub use crops::recommend;
pub use soil::classify;

/// Key of the nested object holding the nutrient readings in an event body
pub const ANOMALY_RESULT_KEY: &str = "anomaly_result";

impl NutrientReading {
    /// Read N, P, K and pH from an anomaly result object
    ///
    /// Fields that are absent or not numeric fall back to the defaults.
    pub fn from_anomaly_result(anomaly_result: &Value) -> Self {
        let defaults = Self::default();
        let field = |name: &str, fallback: f64| {
            anomaly_result
                .get(name)
                .and_then(Value::as_f64)
                .unwrap_or(fallback)
        };

        Self {
            n: field("N", defaults.n),
            p: field("P", defaults.p),
            k: field("K", defaults.k),
            ph: field("ph", defaults.ph),
        }
    }

    /// Extract the reading from a full event body
    pub fn from_payload(payload: &Value) -> Self {
        payload
            .get(ANOMALY_RESULT_KEY)
            .map(Self::from_anomaly_result)
            .unwrap_or_default()
    }
}

/// Build the update for one device event body
pub fn summarize(device_id: impl Into<String>, payload: &Value) -> DeviceUpdate {
    let reading = NutrientReading::from_payload(payload);

    DeviceUpdate {
        device_id: device_id.into(),
        soil: classify(&reading),
        crops: recommend(&reading),
    }
}
