use crate::domain::{
    AppendTelemetrySampleRepoInput, DomainResult, RecentTelemetrySamplesRepoInput,
    TelemetrySample, TelemetrySampleRepository,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory implementation of TelemetrySampleRepository.
///
/// Samples are kept in insertion order; identifiers are assigned from 1 upward.
/// Each append happens under the write lock, so readers never see a partial sample.
pub struct InMemoryTelemetrySampleRepository {
    samples: Arc<RwLock<Vec<TelemetrySample>>>,
}

impl InMemoryTelemetrySampleRepository {
    pub fn new() -> Self {
        Self {
            samples: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryTelemetrySampleRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TelemetrySampleRepository for InMemoryTelemetrySampleRepository {
    async fn append(&self, input: AppendTelemetrySampleRepoInput) -> DomainResult<TelemetrySample> {
        let mut samples = self.samples.write().await;

        if let Some(existing) = samples
            .iter()
            .find(|s| s.captured_at == input.captured_at && s.location == input.location)
        {
            debug!(
                sample_id = existing.id,
                location = %input.location,
                "sample already stored, skipping duplicate append"
            );
            return Ok(existing.clone());
        }

        let sample = TelemetrySample {
            id: samples.len() as i64 + 1,
            captured_at: input.captured_at,
            location: input.location,
            temperature: input.temperature,
            humidity: input.humidity,
            wind_speed: input.wind_speed,
            precipitation_probability: input.precipitation_probability,
            condition: input.condition,
        };
        samples.push(sample.clone());

        Ok(sample)
    }

    async fn recent(
        &self,
        input: RecentTelemetrySamplesRepoInput,
    ) -> DomainResult<Vec<TelemetrySample>> {
        let samples = self.samples.read().await;

        let mut ordered: Vec<&TelemetrySample> = samples.iter().collect();
        ordered.sort_by(|a, b| {
            b.captured_at
                .cmp(&a.captured_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        let limit = input.limit.unwrap_or(ordered.len());
        Ok(ordered.into_iter().take(limit).cloned().collect())
    }
}
