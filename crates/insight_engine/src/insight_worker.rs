use crate::domain::InsightIngestionService;
use crate::nats::create_telemetry_sample_handler;
use common::nats::{BatchConsumer, ConsumerSettings, NatsClient};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct InsightWorkerConfig {
    pub telemetry_stream: String,
    pub telemetry_subject: String,
    pub consumer_name: String,
    pub nats_batch_size: usize,
    pub nats_batch_wait_secs: u64,
    pub nats_max_deliver: i64,
    pub nats_redelivery_delay_ms: u64,
}

impl InsightWorkerConfig {
    fn consumer_settings(&self) -> ConsumerSettings {
        ConsumerSettings {
            stream_name: self.telemetry_stream.clone(),
            consumer_name: self.consumer_name.clone(),
            subject_filter: self.telemetry_subject.clone(),
            batch_size: self.nats_batch_size,
            batch_wait: Duration::from_secs(self.nats_batch_wait_secs),
            max_deliver: self.nats_max_deliver,
            redelivery_delay: Duration::from_millis(self.nats_redelivery_delay_ms),
        }
    }
}

/// Consumes telemetry samples from JetStream and runs them through ingestion
pub struct InsightWorker {
    consumer: BatchConsumer,
}

impl InsightWorker {
    pub async fn new(
        ingestion_service: Arc<InsightIngestionService>,
        nats_client: &NatsClient,
        config: InsightWorkerConfig,
    ) -> anyhow::Result<Self> {
        info!("Initializing insight worker");

        nats_client.ensure_stream(&config.telemetry_stream).await?;

        let consumer = BatchConsumer::create(
            nats_client.jetstream(),
            config.consumer_settings(),
            create_telemetry_sample_handler(ingestion_service),
        )
        .await?;

        Ok(Self { consumer })
    }

    pub async fn run(self, ctx: CancellationToken) -> anyhow::Result<()> {
        self.consumer.run(ctx).await
    }
}
