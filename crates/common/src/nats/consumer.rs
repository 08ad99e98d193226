use anyhow::{Context, Result};
use async_nats::jetstream::{self, consumer::PullConsumer, AckKind, Message};
use futures::{future::BoxFuture, StreamExt};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const FETCH_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// A fetched message, detached from its JetStream handle so a handler can own it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub subject: String,
    pub payload: Vec<u8>,
    /// 1 on first delivery
    pub delivery_count: i64,
}

/// Settlement decided by a handler for one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageDisposition {
    /// Done with this message, including inputs that can never succeed
    Ack,
    /// Redeliver later, with the reason logged
    Nak(String),
}

/// Handles one batch. Returns one disposition per message, in the same order.
pub type BatchHandler =
    Box<dyn Fn(Vec<InboundMessage>) -> BoxFuture<'static, Vec<MessageDisposition>> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct ConsumerSettings {
    pub stream_name: String,
    /// Durable consumer name
    pub consumer_name: String,
    pub subject_filter: String,
    pub batch_size: usize,
    pub batch_wait: Duration,
    /// Deliveries after which the server stops redelivering a message
    pub max_deliver: i64,
    /// Delay requested on every nak
    pub redelivery_delay: Duration,
}

/// Durable JetStream pull consumer feeding batches to a `BatchHandler`
pub struct BatchConsumer {
    consumer: PullConsumer,
    settings: ConsumerSettings,
    handler: BatchHandler,
}

impl BatchConsumer {
    pub async fn create(
        jetstream: &jetstream::Context,
        settings: ConsumerSettings,
        handler: BatchHandler,
    ) -> Result<Self> {
        let consumer = jetstream
            .create_consumer_on_stream(
                jetstream::consumer::pull::Config {
                    name: Some(settings.consumer_name.clone()),
                    durable_name: Some(settings.consumer_name.clone()),
                    filter_subject: settings.subject_filter.clone(),
                    ack_policy: jetstream::consumer::AckPolicy::Explicit,
                    max_deliver: settings.max_deliver,
                    ..Default::default()
                },
                settings.stream_name.as_str(),
            )
            .await
            .with_context(|| {
                format!(
                    "Failed to create consumer {} on stream {}",
                    settings.consumer_name, settings.stream_name
                )
            })?;

        info!(
            stream = %settings.stream_name,
            consumer = %settings.consumer_name,
            subject = %settings.subject_filter,
            max_deliver = settings.max_deliver,
            "JetStream consumer ready"
        );

        Ok(Self {
            consumer,
            settings,
            handler,
        })
    }

    /// Poll until `ctx` is cancelled. An in-flight batch is dropped unsettled
    /// on cancellation and will be redelivered by the server.
    pub async fn run(&self, ctx: CancellationToken) -> Result<()> {
        info!(consumer = %self.settings.consumer_name, "Consuming telemetry batches");

        loop {
            tokio::select! {
                _ = ctx.cancelled() => break,
                polled = self.poll() => {
                    if let Err(e) = polled {
                        error!(error = %e, "Batch poll failed");
                        tokio::time::sleep(FETCH_ERROR_BACKOFF).await;
                    }
                }
            }
        }

        info!(consumer = %self.settings.consumer_name, "Consumer stopped");
        Ok(())
    }

    async fn poll(&self) -> Result<()> {
        let mut fetched = self
            .consumer
            .fetch()
            .max_messages(self.settings.batch_size)
            .expires(self.settings.batch_wait)
            .messages()
            .await
            .context("Failed to fetch messages")?;

        let mut messages = Vec::new();
        while let Some(next) = fetched.next().await {
            match next {
                Ok(msg) => messages.push(msg),
                Err(e) => warn!(error = %e, "Dropped message while receiving batch"),
            }
        }

        if messages.is_empty() {
            return Ok(());
        }

        let inbound: Vec<InboundMessage> = messages.iter().map(detach).collect();
        debug!(batch_len = inbound.len(), "Handling batch");

        let dispositions = align_dispositions(messages.len(), (self.handler)(inbound).await);
        for (msg, disposition) in messages.iter().zip(dispositions) {
            self.settle(msg, disposition).await;
        }

        Ok(())
    }

    async fn settle(&self, msg: &Message, disposition: MessageDisposition) {
        let outcome = match disposition {
            MessageDisposition::Ack => msg.ack().await,
            MessageDisposition::Nak(reason) => {
                warn!(subject = %msg.subject, reason = %reason, "Requesting redelivery");
                msg.ack_with(AckKind::Nak(Some(self.settings.redelivery_delay)))
                    .await
            }
        };

        if let Err(e) = outcome {
            error!(error = %e, subject = %msg.subject, "Failed to settle message");
        }
    }
}

fn detach(msg: &Message) -> InboundMessage {
    InboundMessage {
        subject: msg.subject.to_string(),
        payload: msg.payload.to_vec(),
        delivery_count: msg.info().map(|info| info.delivered).unwrap_or(1),
    }
}

/// Pair handler output with the batch: missing entries are nak'd, extras ignored
fn align_dispositions(
    batch_len: usize,
    mut dispositions: Vec<MessageDisposition>,
) -> Vec<MessageDisposition> {
    if dispositions.len() != batch_len {
        warn!(
            batch_len,
            disposition_count = dispositions.len(),
            "Handler returned a mismatched disposition count"
        );
    }
    dispositions.resize(
        batch_len,
        MessageDisposition::Nak("no disposition returned".to_string()),
    );
    dispositions
}
