use crate::domain::{
    AppendInsightRepoInput, DomainError, DomainResult, Insight, InsightKind, InsightRepository,
    RecentInsightsRepoInput, Severity,
};
use crate::postgres::telemetry_sample_repository::{map_write_error, sql_limit};
use crate::postgres::PostgresClient;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_postgres::Row;
use tracing::{debug, info};

/// Insight row as stored in PostgreSQL
#[derive(Debug, Clone)]
pub struct InsightRow {
    pub id: i64,
    pub kind: String,
    pub title: String,
    pub description: String,
    pub severity: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Row> for InsightRow {
    fn from(row: &Row) -> Self {
        Self {
            id: row.get(0),
            kind: row.get(1),
            title: row.get(2),
            description: row.get(3),
            severity: row.get(4),
            created_at: row.get(5),
        }
    }
}

impl TryFrom<InsightRow> for Insight {
    type Error = DomainError;

    fn try_from(row: InsightRow) -> Result<Self, Self::Error> {
        let kind: InsightKind = row
            .kind
            .parse()
            .map_err(|e: String| DomainError::StorageError(anyhow::anyhow!(e)))?;
        let severity = row
            .severity
            .map(|s| s.parse::<Severity>())
            .transpose()
            .map_err(|e| DomainError::StorageError(anyhow::anyhow!(e)))?;

        Ok(Insight {
            id: row.id,
            kind,
            title: row.title,
            description: row.description,
            severity,
            created_at: row.created_at,
        })
    }
}

#[derive(Clone)]
pub struct PostgresInsightRepository {
    client: PostgresClient,
}

impl PostgresInsightRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl InsightRepository for PostgresInsightRepository {
    async fn append(&self, input: AppendInsightRepoInput) -> DomainResult<Insight> {
        debug!(title = %input.title, kind = %input.kind, "Appending insight");

        let conn = self.client.get_connection().await?;

        let row = conn
            .query_one(
                "INSERT INTO insights (kind, title, description, severity, created_at)
                 VALUES ($1, $2, $3, $4, $5)
                 RETURNING id",
                &[
                    &input.kind.as_str(),
                    &input.title,
                    &input.description,
                    &input.severity.map(|s| s.as_str()),
                    &input.created_at,
                ],
            )
            .await
            .map_err(map_write_error)?;

        let id: i64 = row.get(0);
        info!(insight_id = id, title = %input.title, "Insight stored");

        Ok(Insight {
            id,
            kind: input.kind,
            title: input.title,
            description: input.description,
            severity: input.severity,
            created_at: input.created_at,
        })
    }

    async fn recent(&self, input: RecentInsightsRepoInput) -> DomainResult<Vec<Insight>> {
        debug!(limit = ?input.limit, "Reading recent insights");

        let conn = self.client.get_connection().await?;

        let rows = conn
            .query(
                "SELECT id, kind, title, description, severity, created_at
                 FROM insights
                 ORDER BY created_at DESC, id DESC
                 LIMIT $1",
                &[&sql_limit(input.limit)],
            )
            .await
            .map_err(|e| DomainError::StorageError(e.into()))?;

        rows.iter()
            .map(|row| Insight::try_from(InsightRow::from(row)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(kind: &str, severity: Option<&str>) -> InsightRow {
        InsightRow {
            id: 3,
            kind: kind.to_string(),
            title: "High Humidity Levels".to_string(),
            description: "Average humidity at 85%.".to_string(),
            severity: severity.map(str::to_string),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_to_domain_conversion() {
        let insight = Insight::try_from(row("info", Some("medium"))).unwrap();
        assert_eq!(insight.kind, InsightKind::Info);
        assert_eq!(insight.severity, Some(Severity::Medium));
    }

    #[test]
    fn test_null_severity_is_preserved() {
        let insight = Insight::try_from(row("prediction", None)).unwrap();
        assert_eq!(insight.severity, None);
    }

    #[test]
    fn test_corrupt_kind_is_a_storage_error() {
        let result = Insight::try_from(row("warning", None));
        assert!(matches!(result, Err(DomainError::StorageError(_))));
    }
}
