mod config;

use common::domain::{InsightRepository, TelemetrySampleRepository};
use common::memory::{InMemoryInsightRepository, InMemoryTelemetrySampleRepository};
use common::nats::NatsClient;
use common::postgres::{
    MigrationRunner, PostgresClient, PostgresConfig, PostgresInsightRepository,
    PostgresTelemetrySampleRepository,
};
use common::telemetry::{init_telemetry, shutdown_telemetry, TelemetryConfig, TelemetryProviders};
use crate::config::{ServiceConfig, StorageBackend};
use insight_engine::{
    IngestionConfig, InsightIngestionService, InsightQueryService, InsightWorker,
    InsightWorkerConfig,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() {
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let telemetry_providers: Option<TelemetryProviders> = match init_telemetry(&TelemetryConfig {
        service_name: config.otel_service_name.clone(),
        otel_endpoint: config.otel_endpoint.clone(),
        otel_enabled: config.otel_enabled,
        log_level: config.log_level.clone(),
    }) {
        Ok(providers) => providers,
        Err(e) => {
            eprintln!("Failed to initialize telemetry: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        otel_enabled = config.otel_enabled,
        storage_backend = ?config.storage_backend,
        site = %config.site_name,
        "Starting helios-all-in-one service"
    );
    debug!("Configuration: {:?}", config);

    let repositories = match initialize_repositories(&config).await {
        Ok(repos) => repos,
        Err(e) => {
            error!("Failed to initialize storage: {}", e);
            std::process::exit(1);
        }
    };

    let query_service = InsightQueryService::new(
        repositories.telemetry.clone(),
        repositories.insight.clone(),
    );
    match query_service.efficiency().await {
        Ok(analysis) => info!(
            score = analysis.score,
            factors = ?analysis.factors,
            "Current efficiency"
        ),
        Err(e) => warn!(error = %e, "Could not compute startup efficiency"),
    }

    let ingestion_service = Arc::new(InsightIngestionService::new(
        repositories.telemetry,
        repositories.insight,
        IngestionConfig {
            default_location: config.site_name.clone(),
            insight_window_size: config.insight_window_size,
            generation_window_size: config.generation_window_size,
        },
    ));

    let nats_client = match NatsClient::connect(
        &config.nats_url,
        Duration::from_secs(config.startup_timeout_secs),
    )
    .await
    {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to connect to NATS: {}", e);
            std::process::exit(1);
        }
    };

    let worker = match InsightWorker::new(
        ingestion_service,
        &nats_client,
        InsightWorkerConfig {
            telemetry_stream: config.nats_telemetry_stream.clone(),
            telemetry_subject: config.nats_telemetry_subject.clone(),
            consumer_name: config.nats_consumer_name.clone(),
            nats_batch_size: config.nats_batch_size,
            nats_batch_wait_secs: config.nats_batch_wait_secs,
            nats_max_deliver: config.nats_max_deliver,
            nats_redelivery_delay_ms: config.nats_redelivery_delay_ms,
        },
    )
    .await
    {
        Ok(worker) => worker,
        Err(e) => {
            error!("Failed to initialize insight worker: {}", e);
            std::process::exit(1);
        }
    };

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_signal(shutdown.clone()));

    if let Err(e) = worker.run(shutdown).await {
        error!("Insight worker failed: {}", e);
    }

    info!("Running cleanup tasks...");
    nats_client.close().await;
    shutdown_telemetry(telemetry_providers);
}

struct Repositories {
    telemetry: Arc<dyn TelemetrySampleRepository>,
    insight: Arc<dyn InsightRepository>,
}

async fn initialize_repositories(config: &ServiceConfig) -> anyhow::Result<Repositories> {
    match config.storage_backend {
        StorageBackend::Memory => {
            warn!("Using in-memory storage; data is lost on restart");
            Ok(Repositories {
                telemetry: Arc::new(InMemoryTelemetrySampleRepository::new()),
                insight: Arc::new(InMemoryInsightRepository::new()),
            })
        }
        StorageBackend::Postgres => {
            info!("Initializing PostgreSQL...");
            let postgres_config = postgres_config(config);

            MigrationRunner::new(
                postgres_config.goose_binary_path.clone(),
                postgres_config.migrations_dir.clone(),
                postgres_config.dsn(),
            )
            .run_migrations()
            .await?;

            let client = PostgresClient::new(&postgres_config)?;
            tokio::time::timeout(
                Duration::from_secs(config.startup_timeout_secs),
                client.ping(),
            )
            .await
            .map_err(|_| anyhow::anyhow!("Timed out waiting for PostgreSQL"))??;

            Ok(Repositories {
                telemetry: Arc::new(PostgresTelemetrySampleRepository::new(client.clone())),
                insight: Arc::new(PostgresInsightRepository::new(client)),
            })
        }
    }
}

fn postgres_config(config: &ServiceConfig) -> PostgresConfig {
    PostgresConfig {
        host: config.postgres_host.clone(),
        port: config.postgres_port,
        database: config.postgres_database.clone(),
        username: config.postgres_username.clone(),
        password: config.postgres_password.clone(),
        max_pool_size: config.postgres_max_pool_size,
        migrations_dir: config.postgres_migrations_dir.clone(),
        goose_binary_path: config.postgres_goose_binary_path.clone(),
    }
}

/// Cancel `token` on SIGINT or SIGTERM
async fn cancel_on_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }

    token.cancel();
}
