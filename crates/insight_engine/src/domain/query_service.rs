use crate::domain::{analyze_efficiency, EfficiencyAnalysis, WINDOW_SIZE};
use common::domain::{
    DomainError, DomainResult, Insight, InsightRepository, RecentInsightsRepoInput,
    RecentTelemetrySamplesRepoInput, TelemetrySample, TelemetrySampleRepository,
};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Read-only access to both stores. Never runs derivation or writes anything.
pub struct InsightQueryService {
    telemetry_repository: Arc<dyn TelemetrySampleRepository>,
    insight_repository: Arc<dyn InsightRepository>,
}

impl InsightQueryService {
    pub fn new(
        telemetry_repository: Arc<dyn TelemetrySampleRepository>,
        insight_repository: Arc<dyn InsightRepository>,
    ) -> Self {
        Self {
            telemetry_repository,
            insight_repository,
        }
    }

    /// Up to `limit` samples, newest first; `None` returns all of them
    #[instrument(skip(self))]
    pub async fn recent_samples(&self, limit: Option<usize>) -> DomainResult<Vec<TelemetrySample>> {
        check_limit(limit)?;
        self.telemetry_repository
            .recent(RecentTelemetrySamplesRepoInput { limit })
            .await
    }

    /// Up to `limit` insights, newest first; `None` returns all of them
    #[instrument(skip(self))]
    pub async fn recent_insights(&self, limit: Option<usize>) -> DomainResult<Vec<Insight>> {
        check_limit(limit)?;
        self.insight_repository
            .recent(RecentInsightsRepoInput { limit })
            .await
    }

    #[instrument(skip(self))]
    pub async fn efficiency(&self) -> DomainResult<EfficiencyAnalysis> {
        let window = self
            .telemetry_repository
            .recent(RecentTelemetrySamplesRepoInput {
                limit: Some(WINDOW_SIZE),
            })
            .await?;

        let analysis = analyze_efficiency(&window);
        debug!(
            window_size = window.len(),
            score = analysis.score,
            "efficiency analyzed"
        );
        Ok(analysis)
    }

    /// Every stored sample, newest first, for the export collaborator
    #[instrument(skip(self))]
    pub async fn export_samples(&self) -> DomainResult<Vec<TelemetrySample>> {
        let samples = self
            .telemetry_repository
            .recent(RecentTelemetrySamplesRepoInput { limit: None })
            .await?;
        debug!(sample_count = samples.len(), "samples exported");
        Ok(samples)
    }
}

fn check_limit(limit: Option<usize>) -> DomainResult<()> {
    match limit {
        Some(0) => Err(DomainError::InvalidLimit(
            "limit must be greater than zero".to_string(),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::window::test_support::*;
    use common::domain::{MockInsightRepository, MockTelemetrySampleRepository, SkyCondition};

    #[tokio::test]
    async fn test_recent_samples_forwards_limit() {
        let mut telemetry_repo = MockTelemetrySampleRepository::new();
        telemetry_repo
            .expect_recent()
            .withf(|input| input.limit == Some(10))
            .times(1)
            .return_once(|_| Ok(history_of(10, &calm_sample())));

        let service =
            InsightQueryService::new(Arc::new(telemetry_repo), Arc::new(MockInsightRepository::new()));

        let samples = service.recent_samples(Some(10)).await.unwrap();
        assert_eq!(samples.len(), 10);
    }

    #[tokio::test]
    async fn test_zero_limit_is_rejected() {
        let mut telemetry_repo = MockTelemetrySampleRepository::new();
        let mut insight_repo = MockInsightRepository::new();
        telemetry_repo.expect_recent().times(0);
        insight_repo.expect_recent().times(0);

        let service = InsightQueryService::new(Arc::new(telemetry_repo), Arc::new(insight_repo));

        assert!(matches!(
            service.recent_samples(Some(0)).await,
            Err(DomainError::InvalidLimit(_))
        ));
        assert!(matches!(
            service.recent_insights(Some(0)).await,
            Err(DomainError::InvalidLimit(_))
        ));
    }

    #[tokio::test]
    async fn test_recent_insights_without_limit_reads_everything() {
        let mut insight_repo = MockInsightRepository::new();
        insight_repo
            .expect_recent()
            .withf(|input| input.limit.is_none())
            .times(1)
            .return_once(|_| Ok(Vec::new()));

        let service = InsightQueryService::new(
            Arc::new(MockTelemetrySampleRepository::new()),
            Arc::new(insight_repo),
        );

        assert!(service.recent_insights(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_efficiency_reads_one_window() {
        let mut telemetry_repo = MockTelemetrySampleRepository::new();
        let template = TelemetrySample {
            condition: SkyCondition::Sunny,
            ..calm_sample()
        };
        telemetry_repo
            .expect_recent()
            .withf(|input| input.limit == Some(24))
            .times(1)
            .return_once(move |_| Ok(history_of(24, &template)));

        let service =
            InsightQueryService::new(Arc::new(telemetry_repo), Arc::new(MockInsightRepository::new()));

        let analysis = service.efficiency().await.unwrap();
        assert_eq!(analysis.score, 100);
    }

    #[tokio::test]
    async fn test_efficiency_on_empty_store_is_neutral() {
        let mut telemetry_repo = MockTelemetrySampleRepository::new();
        telemetry_repo
            .expect_recent()
            .times(1)
            .return_once(|_| Ok(Vec::new()));

        let service =
            InsightQueryService::new(Arc::new(telemetry_repo), Arc::new(MockInsightRepository::new()));

        let analysis = service.efficiency().await.unwrap();
        assert_eq!(analysis.score, 50);
        assert!(analysis.factors.is_empty());
    }

    #[tokio::test]
    async fn test_export_reads_without_limit() {
        let mut telemetry_repo = MockTelemetrySampleRepository::new();
        telemetry_repo
            .expect_recent()
            .withf(|input| input.limit.is_none())
            .times(1)
            .return_once(|_| Ok(history_of(100, &calm_sample())));

        let service =
            InsightQueryService::new(Arc::new(telemetry_repo), Arc::new(MockInsightRepository::new()));

        let exported = service.export_samples().await.unwrap();
        assert_eq!(exported.len(), 100);
        assert_eq!(exported[0].id, 100);
    }
}
