use crate::domain::{current_window, WindowStats};
use common::domain::TelemetrySample;
use serde::Serialize;

const BASELINE_SCORE: f64 = 100.0;
const EMPTY_WINDOW_SCORE: u8 = 50;

const HIGH_TEMPERATURE_MEAN: f64 = 30.0;
const HIGH_TEMPERATURE_PENALTY: f64 = 15.0;
const LOW_TEMPERATURE_MEAN: f64 = 15.0;
const LOW_TEMPERATURE_PENALTY: f64 = 5.0;
const MAX_CLOUD_PENALTY: f64 = 40.0;
const SIGNIFICANT_CLOUD_PENALTY: f64 = 20.0;
const HIGH_PRECIPITATION_MEAN: f64 = 50.0;
const HIGH_PRECIPITATION_PENALTY: f64 = 20.0;

pub const FACTOR_HIGH_TEMPERATURE: &str = "High temperature reduces panel efficiency";
pub const FACTOR_LOW_TEMPERATURE: &str = "Low temperature slightly reduces efficiency";
pub const FACTOR_OPTIMAL_TEMPERATURE: &str = "Optimal temperature range for solar generation";
pub const FACTOR_CLOUD_COVER: &str = "Significant cloud cover reducing output";
pub const FACTOR_HIGH_PRECIPITATION: &str = "High precipitation probability";

/// Heuristic generation favorability over the recent window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EfficiencyAnalysis {
    /// 0 to 100
    pub score: u8,
    pub factors: Vec<String>,
}

/// Score the most recent window of a newest-first history.
/// An empty history scores 50 with no factors.
pub fn analyze_efficiency(history: &[TelemetrySample]) -> EfficiencyAnalysis {
    let Some(stats) = WindowStats::from_samples(current_window(history)) else {
        return EfficiencyAnalysis {
            score: EMPTY_WINDOW_SCORE,
            factors: Vec::new(),
        };
    };

    let mut score = BASELINE_SCORE;
    let mut factors = Vec::new();

    if stats.mean_temperature > HIGH_TEMPERATURE_MEAN {
        score -= HIGH_TEMPERATURE_PENALTY;
        factors.push(FACTOR_HIGH_TEMPERATURE.to_string());
    } else if stats.mean_temperature < LOW_TEMPERATURE_MEAN {
        score -= LOW_TEMPERATURE_PENALTY;
        factors.push(FACTOR_LOW_TEMPERATURE.to_string());
    } else {
        factors.push(FACTOR_OPTIMAL_TEMPERATURE.to_string());
    }

    let cloud_impact = stats.overcast_fraction() * MAX_CLOUD_PENALTY;
    score -= cloud_impact;
    if cloud_impact > SIGNIFICANT_CLOUD_PENALTY {
        factors.push(FACTOR_CLOUD_COVER.to_string());
    }

    if stats.mean_precipitation_probability > HIGH_PRECIPITATION_MEAN {
        score -= HIGH_PRECIPITATION_PENALTY;
        factors.push(FACTOR_HIGH_PRECIPITATION.to_string());
    }

    EfficiencyAnalysis {
        score: score.round().clamp(0.0, 100.0) as u8,
        factors,
    }
}
