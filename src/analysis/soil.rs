use crate::{Level, NutrientReading, PhClass, SoilQuality};

/// Placeholder fertility and overall rating
pub const PLACEHOLDER_RATING: &str = "Moderate";

/// (low, high) bounds for nitrogen
pub const N_BOUNDS: (f64, f64) = (50.0, 100.0);

/// (low, high) bounds for phosphorus
pub const P_BOUNDS: (f64, f64) = (30.0, 60.0);

/// (low, high) bounds for potassium
pub const K_BOUNDS: (f64, f64) = (40.0, 80.0);

/// Below this pH the soil is acidic
pub const PH_ACIDIC_BELOW: f64 = 6.0;

/// Above this pH the soil is alkaline
pub const PH_ALKALINE_ABOVE: f64 = 8.0;

/// Classify a value against a (low, high) range; both bounds are inclusive for `Medium`
pub fn level(value: f64, low: f64, high: f64) -> Level {
    if value < low {
        Level::Low
    } else if value > high {
        Level::High
    } else {
        Level::Medium
    }
}

pub fn ph_class(ph: f64) -> PhClass {
    if ph < PH_ACIDIC_BELOW {
        PhClass::Acidic
    } else if ph > PH_ALKALINE_ABOVE {
        PhClass::Alkaline
    } else {
        PhClass::Neutral
    }
}

/// Derive the soil quality of a reading
pub fn classify(reading: &NutrientReading) -> SoilQuality {
    SoilQuality {
        n_level: level(reading.n, N_BOUNDS.0, N_BOUNDS.1),
        p_level: level(reading.p, P_BOUNDS.0, P_BOUNDS.1),
        k_level: level(reading.k, K_BOUNDS.0, K_BOUNDS.1),
        ph_class: ph_class(reading.ph),
        fertility: PLACEHOLDER_RATING.to_string(),
        overall: PLACEHOLDER_RATING.to_string(),
    }
}
