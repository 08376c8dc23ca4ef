use crate::{Crop, CropSuggestion, NutrientReading};

/// Scoring profile for one candidate crop
#[derive(Debug, Clone, Copy)]
struct CropProfile {
    crop: Crop,
    target: f64,
    scale: f64,
    measure: fn(&NutrientReading) -> f64,
}

impl CropProfile {
    /// 1 - |measured - target| / scale, unclamped
    fn score(&self, reading: &NutrientReading) -> f64 {
        1.0 - ((self.measure)(reading) - self.target).abs() / self.scale
    }
}

fn nitrogen(reading: &NutrientReading) -> f64 {
    reading.n
}

fn ph(reading: &NutrientReading) -> f64 {
    reading.ph
}

fn potassium(reading: &NutrientReading) -> f64 {
    reading.k
}

/// Candidates in declaration order; equal scores keep this order.
const PROFILES: [CropProfile; 3] = [
    CropProfile {
        crop: Crop::Wheat,
        target: 90.0,
        scale: 100.0,
        measure: nitrogen,
    },
    CropProfile {
        crop: Crop::Rice,
        target: 6.5,
        scale: 10.0,
        measure: ph,
    },
    CropProfile {
        crop: Crop::Corn,
        target: 40.0,
        scale: 50.0,
        measure: potassium,
    },
];

/// Rank the candidate crops for a reading, best first
pub fn recommend(reading: &NutrientReading) -> Vec<CropSuggestion> {
    let mut suggestions: Vec<CropSuggestion> = PROFILES
        .iter()
        .map(|profile| CropSuggestion {
            crop: profile.crop,
            score: profile.score(reading),
        })
        .collect();

    // sort_by is stable
    suggestions.sort_by(|a, b| b.score.total_cmp(&a.score));
    suggestions
}
