use common::domain::TelemetrySample;

/// Number of most recent samples the rules and the efficiency score look at
pub const WINDOW_SIZE: usize = 24;

/// Number of samples a full period-over-period comparison needs
pub const HISTORY_SIZE: usize = WINDOW_SIZE * 2;

/// The most recent `WINDOW_SIZE` samples of a newest-first history
pub fn current_window(history: &[TelemetrySample]) -> &[TelemetrySample] {
    &history[..history.len().min(WINDOW_SIZE)]
}

/// The block of samples immediately preceding the current window
pub fn previous_window(history: &[TelemetrySample]) -> &[TelemetrySample] {
    let start = history.len().min(WINDOW_SIZE);
    let end = history.len().min(HISTORY_SIZE);
    &history[start..end]
}

/// Aggregates over a non-empty window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStats {
    pub len: usize,
    pub max_temperature: f64,
    pub mean_temperature: f64,
    pub mean_humidity: f64,
    pub mean_wind_speed: f64,
    pub mean_precipitation_probability: f64,
    /// Samples reporting Sunny or Partly Cloudy
    pub clear_count: usize,
    /// Samples reporting Cloudy or Rainy
    pub overcast_count: usize,
}

impl WindowStats {
    /// Returns `None` for an empty window
    pub fn from_samples(samples: &[TelemetrySample]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let len = samples.len();
        let n = len as f64;

        Some(Self {
            len,
            max_temperature: samples
                .iter()
                .map(|s| s.temperature)
                .fold(f64::NEG_INFINITY, f64::max),
            mean_temperature: samples.iter().map(|s| s.temperature).sum::<f64>() / n,
            mean_humidity: samples.iter().map(|s| s.humidity).sum::<f64>() / n,
            mean_wind_speed: samples.iter().map(|s| s.wind_speed).sum::<f64>() / n,
            mean_precipitation_probability: samples
                .iter()
                .map(|s| s.precipitation_probability)
                .sum::<f64>()
                / n,
            clear_count: samples.iter().filter(|s| s.condition.is_clear()).count(),
            overcast_count: samples.iter().filter(|s| s.condition.is_overcast()).count(),
        })
    }

    pub fn clear_fraction(&self) -> f64 {
        self.clear_count as f64 / self.len as f64
    }

    pub fn overcast_fraction(&self) -> f64 {
        self.overcast_count as f64 / self.len as f64
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use common::domain::{SkyCondition, TelemetrySample};

    pub fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap()
    }

    /// A mild, clear reading that triggers no rule on its own
    pub fn calm_sample() -> TelemetrySample {
        TelemetrySample {
            id: 1,
            captured_at: base_time(),
            location: "São Paulo, BR".to_string(),
            temperature: 22.0,
            humidity: 50.0,
            wind_speed: 10.0,
            precipitation_probability: 10.0,
            condition: SkyCondition::Cloudy,
        }
    }

    /// Newest-first history of `count` copies of `template`, one hour apart
    pub fn history_of(count: usize, template: &TelemetrySample) -> Vec<TelemetrySample> {
        (0..count)
            .map(|i| TelemetrySample {
                id: (count - i) as i64,
                captured_at: template.captured_at - Duration::hours(i as i64),
                ..template.clone()
            })
            .collect()
    }
}
