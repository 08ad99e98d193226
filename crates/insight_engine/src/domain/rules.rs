use crate::domain::{current_window, previous_window, WindowStats, WINDOW_SIZE};
use common::domain::{InsightKind, Severity, TelemetrySample};
use serde::Serialize;

/// Upper bound on insights produced by one derivation
pub const MAX_INSIGHTS: usize = 5;

const EXTREME_HEAT_THRESHOLD: f64 = 35.0;
const HIGH_TEMPERATURE_THRESHOLD: f64 = 30.0;
const HIGH_RAIN_THRESHOLD: f64 = 70.0;
const STRONG_WIND_THRESHOLD: f64 = 40.0;
const HIGH_HUMIDITY_THRESHOLD: f64 = 80.0;
const OPTIMAL_CLEAR_FRACTION: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightRule {
    ExtremeHeat,
    HighTemperature,
    HighRainProbability,
    StrongWind,
    HighHumidity,
    OptimalConditions,
    PeriodSummary,
}

/// Rank order of the rules. Earlier rules win when the output is truncated.
pub const RULE_PRIORITY: [InsightRule; 7] = [
    InsightRule::ExtremeHeat,
    InsightRule::HighTemperature,
    InsightRule::HighRainProbability,
    InsightRule::StrongWind,
    InsightRule::HighHumidity,
    InsightRule::OptimalConditions,
    InsightRule::PeriodSummary,
];

/// An insight produced by the engine, not yet stored
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightDraft {
    pub rule: InsightRule,
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl InsightRule {
    pub fn title(&self) -> &'static str {
        match self {
            InsightRule::ExtremeHeat => "Extreme Heat Warning",
            InsightRule::HighTemperature => "High Temperature Detected",
            InsightRule::HighRainProbability => "High Rain Probability",
            InsightRule::StrongWind => "Strong Wind Alert",
            InsightRule::HighHumidity => "High Humidity Levels",
            InsightRule::OptimalConditions => "Optimal Generation Conditions",
            InsightRule::PeriodSummary => "24-Hour Summary",
        }
    }

    pub fn kind(&self) -> InsightKind {
        match self {
            InsightRule::ExtremeHeat
            | InsightRule::HighRainProbability
            | InsightRule::StrongWind => InsightKind::Alert,
            InsightRule::HighTemperature
            | InsightRule::HighHumidity
            | InsightRule::PeriodSummary => InsightKind::Info,
            InsightRule::OptimalConditions => InsightKind::Prediction,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            InsightRule::ExtremeHeat
            | InsightRule::HighRainProbability
            | InsightRule::StrongWind => Severity::High,
            InsightRule::HighTemperature | InsightRule::HighHumidity => Severity::Medium,
            InsightRule::OptimalConditions | InsightRule::PeriodSummary => Severity::Low,
        }
    }

    /// Description for this rule if it fires, `None` otherwise.
    /// `stats` covers the current window; `history` is the full newest-first input.
    fn evaluate(&self, stats: &WindowStats, history: &[TelemetrySample]) -> Option<String> {
        match self {
            InsightRule::ExtremeHeat => (stats.max_temperature > EXTREME_HEAT_THRESHOLD).then(|| {
                format!(
                    "Temperature reached {:.1}°C. Consider cooling systems for solar panels to maintain efficiency.",
                    round_to_tenth(stats.max_temperature)
                )
            }),
            InsightRule::HighTemperature => (stats.max_temperature > HIGH_TEMPERATURE_THRESHOLD
                && stats.max_temperature <= EXTREME_HEAT_THRESHOLD)
                .then(|| {
                    format!(
                        "Peak temperature of {:.1}°C. Panel efficiency may decrease by 10-15%.",
                        round_to_tenth(stats.max_temperature)
                    )
                }),
            InsightRule::HighRainProbability => (stats.mean_precipitation_probability
                > HIGH_RAIN_THRESHOLD)
                .then(|| {
                    format!(
                        "{}% average rain probability. Expected 30-50% reduction in solar generation.",
                        round_to_int(stats.mean_precipitation_probability)
                    )
                }),
            InsightRule::StrongWind => (stats.mean_wind_speed > STRONG_WIND_THRESHOLD).then(|| {
                format!(
                    "Wind speeds averaging {:.1} km/h. Secure loose equipment and check panel mounting.",
                    round_to_tenth(stats.mean_wind_speed)
                )
            }),
            InsightRule::HighHumidity => (stats.mean_humidity > HIGH_HUMIDITY_THRESHOLD).then(|| {
                format!(
                    "Average humidity at {}%. Monitor for condensation on electrical components.",
                    round_to_int(stats.mean_humidity)
                )
            }),
            InsightRule::OptimalConditions => (stats.clear_fraction() > OPTIMAL_CLEAR_FRACTION)
                .then(|| {
                    format!(
                        "{}% clear skies detected. Solar production estimated to exceed baseline by 15-20%.",
                        round_to_int(stats.clear_fraction() * 100.0)
                    )
                }),
            InsightRule::PeriodSummary => period_summary(stats, history),
        }
    }
}

/// Compares the current window against the block before it.
/// Needs a full current window and at least one earlier sample.
fn period_summary(stats: &WindowStats, history: &[TelemetrySample]) -> Option<String> {
    if history.len() < WINDOW_SIZE {
        return None;
    }
    let previous = WindowStats::from_samples(previous_window(history))?;

    // -0.0 after rounding reads as "+0.0"
    let delta = round_to_tenth(stats.mean_temperature - previous.mean_temperature) + 0.0;
    let sign = if delta >= 0.0 { "+" } else { "" };

    Some(format!(
        "Average temperature: {:.1}°C ({}{:.1}°C from previous day). Humidity: {}%.",
        round_to_tenth(stats.mean_temperature),
        sign,
        delta,
        round_to_int(stats.mean_humidity)
    ))
}

/// Round half away from zero
fn round_to_int(value: f64) -> i64 {
    value.round() as i64
}

/// One decimal place, half away from zero. `{:.1}` alone rounds ties to even.
fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Derive ranked insights from a newest-first telemetry history.
///
/// Threshold rules look at the most recent `WINDOW_SIZE` samples. The period
/// summary also reads the block of up to `WINDOW_SIZE` samples before that.
/// At most `MAX_INSIGHTS` drafts are returned, in `RULE_PRIORITY` order.
pub fn generate_insights(history: &[TelemetrySample]) -> Vec<InsightDraft> {
    let Some(stats) = WindowStats::from_samples(current_window(history)) else {
        return Vec::new();
    };

    RULE_PRIORITY
        .iter()
        .filter_map(|rule| {
            rule.evaluate(&stats, history).map(|description| InsightDraft {
                rule: *rule,
                kind: rule.kind(),
                title: rule.title().to_string(),
                description,
                severity: rule.severity(),
            })
        })
        .take(MAX_INSIGHTS)
        .collect()
}
