use anyhow::{Context, Result};
use async_nats::jetstream::{self, stream::Config as StreamConfig};
use std::time::Duration;
use tracing::info;

/// Thin wrapper over an async-nats connection and its JetStream context
pub struct NatsClient {
    jetstream: jetstream::Context,
}

impl NatsClient {
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self> {
        info!(url = %url, timeout_ms = timeout.as_millis(), "Connecting to NATS");

        let client = async_nats::ConnectOptions::new()
            .connection_timeout(timeout)
            .connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Successfully connected to NATS");
        Ok(Self {
            jetstream: jetstream::new(client),
        })
    }

    /// Create the stream if it does not exist yet.
    /// The stream captures every subject under `{stream_name}.>`.
    pub async fn ensure_stream(&self, stream_name: &str) -> Result<()> {
        if self.jetstream.get_stream(stream_name).await.is_ok() {
            info!(stream = %stream_name, "Stream already exists");
            return Ok(());
        }

        self.jetstream
            .create_stream(StreamConfig {
                name: stream_name.to_string(),
                subjects: vec![format!("{}.>", stream_name)],
                description: Some("Telemetry samples awaiting ingestion".to_string()),
                ..Default::default()
            })
            .await
            .context("Failed to create stream")?;

        info!(stream = %stream_name, "Created stream");
        Ok(())
    }

    pub fn jetstream(&self) -> &jetstream::Context {
        &self.jetstream
    }

    pub async fn close(self) {
        info!("Closing NATS connection");
        // Connection closes when the last handle is dropped
    }
}
