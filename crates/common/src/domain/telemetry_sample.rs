use crate::domain::result::DomainResult;
use crate::domain::SkyCondition;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};

/// A single environmental reading as stored.
/// Samples are append-only: once stored they are never updated or removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub id: i64,
    pub captured_at: DateTime<Utc>,
    pub location: String,
    /// Degrees Celsius
    pub temperature: f64,
    /// Relative humidity, percent
    pub humidity: f64,
    /// km/h
    pub wind_speed: f64,
    /// Percent
    pub precipitation_probability: f64,
    pub condition: SkyCondition,
}

/// A reading arriving from the ingestion boundary, before validation.
/// `location` falls back to the configured site name when absent.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct NewTelemetrySample {
    #[garde(skip)]
    pub captured_at: DateTime<Utc>,
    #[garde(length(min = 1))]
    pub location: Option<String>,
    #[garde(custom(finite))]
    pub temperature: f64,
    #[garde(custom(finite), range(min = 0.0, max = 100.0))]
    pub humidity: f64,
    #[garde(custom(finite), range(min = 0.0))]
    pub wind_speed: f64,
    #[garde(custom(finite), range(min = 0.0, max = 100.0))]
    pub precipitation_probability: f64,
    #[garde(custom(non_blank_label))]
    pub condition: SkyCondition,
}

fn finite(value: &f64, _context: &()) -> garde::Result {
    if value.is_finite() {
        Ok(())
    } else {
        Err(garde::Error::new("must be a finite number"))
    }
}

fn non_blank_label(value: &SkyCondition, _context: &()) -> garde::Result {
    if value.as_str().trim().is_empty() {
        Err(garde::Error::new("condition cannot be empty"))
    } else {
        Ok(())
    }
}

/// Repository input for appending a validated sample
#[derive(Debug, Clone, PartialEq)]
pub struct AppendTelemetrySampleRepoInput {
    pub captured_at: DateTime<Utc>,
    pub location: String,
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub precipitation_probability: f64,
    pub condition: SkyCondition,
}

impl AppendTelemetrySampleRepoInput {
    /// Build the repository input, resolving a missing location to `default_location`
    pub fn from_new_sample(sample: NewTelemetrySample, default_location: &str) -> Self {
        Self {
            captured_at: sample.captured_at,
            location: sample
                .location
                .unwrap_or_else(|| default_location.to_string()),
            temperature: sample.temperature,
            humidity: sample.humidity,
            wind_speed: sample.wind_speed,
            precipitation_probability: sample.precipitation_probability,
            condition: sample.condition,
        }
    }
}

/// Repository input for a recency-bounded read.
/// `limit: None` returns every stored sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecentTelemetrySamplesRepoInput {
    pub limit: Option<usize>,
}

/// Repository trait for telemetry sample storage operations
///
/// Implementations must:
/// - Treat (captured_at, location) as a natural key: appending a sample whose key
///   already exists returns the stored sample instead of creating a second one
/// - Return samples ordered by `captured_at` descending, ties broken by the most
///   recently inserted first
/// - Make each append atomic from a concurrent reader's point of view
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait TelemetrySampleRepository: Send + Sync {
    /// Append a sample, assigning its identifier
    async fn append(&self, input: AppendTelemetrySampleRepoInput) -> DomainResult<TelemetrySample>;

    /// Read up to `limit` samples, newest first
    async fn recent(
        &self,
        input: RecentTelemetrySamplesRepoInput,
    ) -> DomainResult<Vec<TelemetrySample>>;
}
