use chrono::{DateTime, Duration, TimeZone, Utc};
use common::domain::{NewTelemetrySample, SkyCondition};
use common::memory::{InMemoryInsightRepository, InMemoryTelemetrySampleRepository};
use insight_engine::{IngestionConfig, InsightIngestionService, InsightQueryService};
use std::sync::Arc;

struct Pipeline {
    ingestion: InsightIngestionService,
    queries: InsightQueryService,
}

fn pipeline() -> Pipeline {
    let telemetry_repo = Arc::new(InMemoryTelemetrySampleRepository::new());
    let insight_repo = Arc::new(InMemoryInsightRepository::new());

    Pipeline {
        ingestion: InsightIngestionService::new(
            telemetry_repo.clone(),
            insight_repo.clone(),
            IngestionConfig {
                default_location: "Test Site".to_string(),
                ..Default::default()
            },
        ),
        queries: InsightQueryService::new(telemetry_repo, insight_repo),
    }
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 14, 0, 0, 0).unwrap()
}

fn reading(hour: i64, temperature: f64, condition: SkyCondition) -> NewTelemetrySample {
    NewTelemetrySample {
        captured_at: start() + Duration::hours(hour),
        location: None,
        temperature,
        humidity: 40.0,
        wind_speed: 5.0,
        precipitation_probability: 10.0,
        condition,
    }
}

#[tokio::test]
async fn test_each_ingest_stores_at_most_one_insight() {
    let pipeline = pipeline();

    for hour in 0..24 {
        let outcome = pipeline
            .ingestion
            .ingest(reading(hour, 38.0, SkyCondition::Sunny))
            .await
            .unwrap();
        assert_eq!(outcome.sample.location, "Test Site");
        assert_eq!(
            outcome.insight.map(|i| i.title),
            Some("Extreme Heat Warning".to_string())
        );
    }

    let insights = pipeline.queries.recent_insights(None).await.unwrap();
    assert_eq!(insights.len(), 24);
    assert!(insights.iter().all(|i| i.title == "Extreme Heat Warning"));

    let efficiency = pipeline.queries.efficiency().await.unwrap();
    assert_eq!(efficiency.score, 85);
    assert_eq!(
        efficiency.factors.first().map(String::as_str),
        Some("High temperature reduces panel efficiency")
    );
}

#[tokio::test]
async fn test_generate_now_compares_against_previous_day() {
    let pipeline = pipeline();

    for hour in 0..24 {
        pipeline
            .ingestion
            .ingest(reading(hour, 15.0, SkyCondition::Cloudy))
            .await
            .unwrap();
    }
    for hour in 24..48 {
        pipeline
            .ingestion
            .ingest(reading(hour, 20.0, SkyCondition::Cloudy))
            .await
            .unwrap();
    }

    // Nothing fires for mild overcast readings
    assert!(pipeline
        .queries
        .recent_insights(None)
        .await
        .unwrap()
        .is_empty());

    let generated = pipeline.ingestion.generate_now().await.unwrap();

    assert_eq!(generated.len(), 1);
    assert_eq!(generated[0].title, "24-Hour Summary");
    assert_eq!(
        generated[0].description,
        "Average temperature: 20.0°C (+5.0°C from previous day). Humidity: 40%."
    );

    // Manual generation does not dedupe against what is stored
    pipeline.ingestion.generate_now().await.unwrap();
    assert_eq!(pipeline.queries.recent_insights(None).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_retried_ingest_does_not_duplicate_sample() {
    let pipeline = pipeline();

    let first = pipeline
        .ingestion
        .ingest(reading(0, 22.0, SkyCondition::Rainy))
        .await
        .unwrap();
    let retried = pipeline
        .ingestion
        .ingest(reading(0, 22.0, SkyCondition::Rainy))
        .await
        .unwrap();

    assert_eq!(first.sample.id, retried.sample.id);
    assert_eq!(pipeline.queries.export_samples().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_queries_return_newest_first() {
    let pipeline = pipeline();

    for hour in 0..10 {
        pipeline
            .ingestion
            .ingest(reading(hour, 20.0 + hour as f64, SkyCondition::Cloudy))
            .await
            .unwrap();
    }

    let recent = pipeline.queries.recent_samples(Some(4)).await.unwrap();
    assert_eq!(recent.len(), 4);
    assert!(recent
        .windows(2)
        .all(|pair| pair[0].captured_at >= pair[1].captured_at));
    assert_eq!(recent[0].temperature, 29.0);

    let exported = pipeline.queries.export_samples().await.unwrap();
    assert_eq!(exported.len(), 10);
    assert_eq!(exported[9].temperature, 20.0);
}

#[tokio::test]
async fn test_empty_system() {
    let pipeline = pipeline();

    assert!(pipeline.queries.recent_samples(None).await.unwrap().is_empty());
    assert!(pipeline.queries.recent_insights(Some(5)).await.unwrap().is_empty());
    assert!(pipeline.ingestion.generate_now().await.unwrap().is_empty());

    let efficiency = pipeline.queries.efficiency().await.unwrap();
    assert_eq!(efficiency.score, 50);
    assert!(efficiency.factors.is_empty());
}
