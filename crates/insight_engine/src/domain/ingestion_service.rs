use crate::domain::{generate_insights, InsightDraft, HISTORY_SIZE, WINDOW_SIZE};
use chrono::Utc;
use common::domain::{
    AppendInsightRepoInput, AppendTelemetrySampleRepoInput, DomainResult, Insight,
    InsightRepository, NewTelemetrySample, RecentTelemetrySamplesRepoInput, TelemetrySample,
    TelemetrySampleRepository,
};
use common::garde::validate_struct;
use std::sync::Arc;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone)]
pub struct IngestionConfig {
    /// Location stamped on samples that arrive without one
    pub default_location: String,
    /// Samples read after each ingest
    pub insight_window_size: usize,
    /// Samples read by a manual generation run
    pub generation_window_size: usize,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            default_location: "São Paulo, BR".to_string(),
            insight_window_size: WINDOW_SIZE,
            generation_window_size: HISTORY_SIZE,
        }
    }
}

/// Result of ingesting one sample
#[derive(Debug, Clone, PartialEq)]
pub struct IngestionOutcome {
    pub sample: TelemetrySample,
    /// The top-ranked insight derived after the append, if any rule fired
    pub insight: Option<Insight>,
}

/// Coordinates sample storage and insight derivation
///
/// Flow for each sample:
/// 1. Validate and append to the telemetry store
/// 2. Read the most recent window
/// 3. Run the rule engine
/// 4. Persist only the highest-ranked insight
///
/// Sample and insight writes are not atomic. A failed insight write is returned
/// to the caller; retrying the whole ingest is safe because the sample append is
/// idempotent on (captured_at, location).
pub struct InsightIngestionService {
    telemetry_repository: Arc<dyn TelemetrySampleRepository>,
    insight_repository: Arc<dyn InsightRepository>,
    config: IngestionConfig,
}

impl InsightIngestionService {
    pub fn new(
        telemetry_repository: Arc<dyn TelemetrySampleRepository>,
        insight_repository: Arc<dyn InsightRepository>,
        config: IngestionConfig,
    ) -> Self {
        Self {
            telemetry_repository,
            insight_repository,
            config,
        }
    }

    #[instrument(skip(self, sample), fields(captured_at = %sample.captured_at))]
    pub async fn ingest(&self, sample: NewTelemetrySample) -> DomainResult<IngestionOutcome> {
        validate_struct(&sample)?;

        let input =
            AppendTelemetrySampleRepoInput::from_new_sample(sample, &self.config.default_location);
        let sample = self.telemetry_repository.append(input).await?;

        debug!(sample_id = sample.id, location = %sample.location, "sample stored");

        let window = self
            .telemetry_repository
            .recent(RecentTelemetrySamplesRepoInput {
                limit: Some(self.config.insight_window_size),
            })
            .await?;

        let drafts = generate_insights(&window);
        debug!(
            window_size = window.len(),
            candidate_count = drafts.len(),
            "derived insight candidates"
        );

        let insight = match drafts.into_iter().next() {
            Some(draft) => Some(self.store_draft(draft).await?),
            None => None,
        };

        Ok(IngestionOutcome { sample, insight })
    }

    /// Derive insights from the larger history window and persist every candidate,
    /// without checking what is already stored
    #[instrument(skip(self))]
    pub async fn generate_now(&self) -> DomainResult<Vec<Insight>> {
        let history = self
            .telemetry_repository
            .recent(RecentTelemetrySamplesRepoInput {
                limit: Some(self.config.generation_window_size),
            })
            .await?;

        let drafts = generate_insights(&history);

        let mut stored = Vec::with_capacity(drafts.len());
        for draft in drafts {
            stored.push(self.store_draft(draft).await?);
        }

        info!(
            history_size = history.len(),
            insight_count = stored.len(),
            "manual insight generation complete"
        );

        Ok(stored)
    }

    async fn store_draft(&self, draft: InsightDraft) -> DomainResult<Insight> {
        let insight = self
            .insight_repository
            .append(AppendInsightRepoInput {
                kind: draft.kind,
                title: draft.title,
                description: draft.description,
                severity: Some(draft.severity),
                created_at: Utc::now(),
            })
            .await?;

        info!(
            insight_id = insight.id,
            title = %insight.title,
            severity = %insight.effective_severity(),
            "insight stored"
        );

        Ok(insight)
    }
}
