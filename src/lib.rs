pub mod actors;
pub mod analysis;
pub mod api;
pub mod config;
pub mod storage;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Nutrient level for N, P and K
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    Low,
    Medium,
    High,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Low => write!(f, "Low"),
            Level::Medium => write!(f, "Medium"),
            Level::High => write!(f, "High"),
        }
    }
}

/// Soil acidity class derived from the pH reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhClass {
    Acidic,
    Neutral,
    Alkaline,
}

impl fmt::Display for PhClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhClass::Acidic => write!(f, "Acidic"),
            PhClass::Neutral => write!(f, "Neutral"),
            PhClass::Alkaline => write!(f, "Alkaline"),
        }
    }
}

/// The four nutrient readings carried by an anomaly result
///
/// Missing readings are substituted with the values of [`NutrientReading::default`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutrientReading {
    pub n: f64,
    pub p: f64,
    pub k: f64,
    pub ph: f64,
}

impl Default for NutrientReading {
    fn default() -> Self {
        Self {
            n: 50.0,
            p: 50.0,
            k: 50.0,
            ph: 7.0,
        }
    }
}

/// Soil classification of a single reading
///
/// `fertility` and `overall` are fixed descriptive placeholders and are not
/// derived from the reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoilQuality {
    pub n_level: Level,
    pub p_level: Level,
    pub k_level: Level,
    pub ph_class: PhClass,
    pub fertility: String,
    pub overall: String,
}

impl fmt::Display for SoilQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "N={} P={} K={} pH={} fertility={} overall={}",
            self.n_level, self.p_level, self.k_level, self.ph_class, self.fertility, self.overall
        )
    }
}

/// Candidate crops, in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Crop {
    Wheat,
    Rice,
    Corn,
}

impl fmt::Display for Crop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Crop::Wheat => write!(f, "Wheat"),
            Crop::Rice => write!(f, "Rice"),
            Crop::Corn => write!(f, "Corn"),
        }
    }
}

/// A scored crop recommendation
///
/// Scores are not clamped and may be negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropSuggestion {
    pub crop: Crop,
    pub score: f64,
}

/// Result of processing one device reading inside a region worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceUpdate {
    pub device_id: String,
    pub soil: SoilQuality,
    pub crops: Vec<CropSuggestion>,
}
