use crate::domain::{
    AppendInsightRepoInput, DomainResult, Insight, InsightRepository, RecentInsightsRepoInput,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory implementation of InsightRepository
pub struct InMemoryInsightRepository {
    insights: Arc<RwLock<Vec<Insight>>>,
}

impl InMemoryInsightRepository {
    pub fn new() -> Self {
        Self {
            insights: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryInsightRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InsightRepository for InMemoryInsightRepository {
    async fn append(&self, input: AppendInsightRepoInput) -> DomainResult<Insight> {
        let mut insights = self.insights.write().await;

        let insight = Insight {
            id: insights.len() as i64 + 1,
            kind: input.kind,
            title: input.title,
            description: input.description,
            severity: input.severity,
            created_at: input.created_at,
        };
        insights.push(insight.clone());

        Ok(insight)
    }

    async fn recent(&self, input: RecentInsightsRepoInput) -> DomainResult<Vec<Insight>> {
        let insights = self.insights.read().await;

        let mut ordered: Vec<&Insight> = insights.iter().collect();
        ordered.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));

        let limit = input.limit.unwrap_or(ordered.len());
        Ok(ordered.into_iter().take(limit).cloned().collect())
    }
}
