use crate::domain::{
    AppendTelemetrySampleRepoInput, DomainError, DomainResult, RecentTelemetrySamplesRepoInput,
    SkyCondition, TelemetrySample, TelemetrySampleRepository,
};
use crate::postgres::PostgresClient;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_postgres::Row;
use tracing::{debug, info};

const SAMPLE_COLUMNS: &str = "id, captured_at, location, temperature, humidity, wind_speed, \
                              precipitation_probability, sky_condition";

/// Telemetry sample row as stored in PostgreSQL
#[derive(Debug, Clone)]
pub struct TelemetrySampleRow {
    pub id: i64,
    pub captured_at: DateTime<Utc>,
    pub location: String,
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub precipitation_probability: f64,
    pub sky_condition: String,
}

impl From<&Row> for TelemetrySampleRow {
    fn from(row: &Row) -> Self {
        Self {
            id: row.get(0),
            captured_at: row.get(1),
            location: row.get(2),
            temperature: row.get(3),
            humidity: row.get(4),
            wind_speed: row.get(5),
            precipitation_probability: row.get(6),
            sky_condition: row.get(7),
        }
    }
}

impl From<TelemetrySampleRow> for TelemetrySample {
    fn from(row: TelemetrySampleRow) -> Self {
        TelemetrySample {
            id: row.id,
            captured_at: row.captured_at,
            location: row.location,
            temperature: row.temperature,
            humidity: row.humidity,
            wind_speed: row.wind_speed,
            precipitation_probability: row.precipitation_probability,
            condition: SkyCondition::from(row.sky_condition),
        }
    }
}

/// Convert a caller-facing limit to a SQL `LIMIT` parameter; `None` binds NULL (no limit)
pub(crate) fn sql_limit(limit: Option<usize>) -> Option<i64> {
    limit.map(|l| i64::try_from(l).unwrap_or(i64::MAX))
}

pub(crate) fn map_write_error(e: tokio_postgres::Error) -> DomainError {
    if let Some(db_err) = e.as_db_error() {
        // check_violation
        if db_err.code().code() == "23514" {
            return DomainError::ValidationError(db_err.message().to_string());
        }
    }
    DomainError::StorageError(e.into())
}

#[derive(Clone)]
pub struct PostgresTelemetrySampleRepository {
    client: PostgresClient,
}

impl PostgresTelemetrySampleRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TelemetrySampleRepository for PostgresTelemetrySampleRepository {
    async fn append(&self, input: AppendTelemetrySampleRepoInput) -> DomainResult<TelemetrySample> {
        debug!(
            captured_at = %input.captured_at,
            location = %input.location,
            "Appending telemetry sample"
        );

        let conn = self.client.get_connection().await?;

        let inserted = conn
            .query_opt(
                "INSERT INTO telemetry_samples
                     (captured_at, location, temperature, humidity, wind_speed,
                      precipitation_probability, sky_condition)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)
                 ON CONFLICT ON CONSTRAINT telemetry_samples_natural_key DO NOTHING
                 RETURNING id",
                &[
                    &input.captured_at,
                    &input.location,
                    &input.temperature,
                    &input.humidity,
                    &input.wind_speed,
                    &input.precipitation_probability,
                    &input.condition.as_str(),
                ],
            )
            .await
            .map_err(map_write_error)?;

        if let Some(row) = inserted {
            let id: i64 = row.get(0);
            info!(sample_id = id, "Telemetry sample stored");

            return Ok(TelemetrySample {
                id,
                captured_at: input.captured_at,
                location: input.location,
                temperature: input.temperature,
                humidity: input.humidity,
                wind_speed: input.wind_speed,
                precipitation_probability: input.precipitation_probability,
                condition: input.condition,
            });
        }

        // Natural key already present: this is a retried append
        let existing = conn
            .query_one(
                &format!(
                    "SELECT {} FROM telemetry_samples WHERE captured_at = $1 AND location = $2",
                    SAMPLE_COLUMNS
                ),
                &[&input.captured_at, &input.location],
            )
            .await
            .map_err(|e| DomainError::StorageError(e.into()))?;

        let sample: TelemetrySample = TelemetrySampleRow::from(&existing).into();
        debug!(sample_id = sample.id, "Telemetry sample already stored");
        Ok(sample)
    }

    async fn recent(
        &self,
        input: RecentTelemetrySamplesRepoInput,
    ) -> DomainResult<Vec<TelemetrySample>> {
        debug!(limit = ?input.limit, "Reading recent telemetry samples");

        let conn = self.client.get_connection().await?;

        let rows = conn
            .query(
                &format!(
                    "SELECT {} FROM telemetry_samples
                     ORDER BY captured_at DESC, id DESC
                     LIMIT $1",
                    SAMPLE_COLUMNS
                ),
                &[&sql_limit(input.limit)],
            )
            .await
            .map_err(|e| DomainError::StorageError(e.into()))?;

        Ok(rows
            .iter()
            .map(|row| TelemetrySampleRow::from(row).into())
            .collect())
    }
}
