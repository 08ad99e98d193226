use crate::domain::InsightIngestionService;
use chrono::{DateTime, Utc};
use common::domain::{NewTelemetrySample, SkyCondition};
use common::nats::{BatchHandler, InboundMessage, MessageDisposition};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// JSON body published by the weather collector.
/// Either a `condition` label or a WMO `weatherCode` must be present; the label wins.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySampleMessage {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub weather_code: Option<u16>,
    #[serde(rename = "precipitationProb")]
    pub precipitation_probability: f64,
}

impl TelemetrySampleMessage {
    /// `None` when the message carries neither a label nor a code
    pub fn sky_condition(&self) -> Option<SkyCondition> {
        match (&self.condition, self.weather_code) {
            (Some(label), _) => Some(SkyCondition::from(label.as_str())),
            (None, Some(code)) => Some(SkyCondition::from_wmo_code(code)),
            (None, None) => None,
        }
    }

    pub fn into_new_sample(self) -> Option<NewTelemetrySample> {
        let condition = self.sky_condition()?;
        Some(NewTelemetrySample {
            captured_at: self.timestamp,
            location: self.location,
            temperature: self.temperature,
            humidity: self.humidity,
            wind_speed: self.wind_speed,
            precipitation_probability: self.precipitation_probability,
            condition,
        })
    }
}

/// Decode and ingest one message.
///
/// Malformed JSON and storage failures are rejected for redelivery. Samples that
/// fail validation, or carry no sky condition at all, are acknowledged and
/// dropped, since redelivery cannot fix them.
pub async fn handle_telemetry_message(
    service: &InsightIngestionService,
    message: &InboundMessage,
) -> MessageDisposition {
    let decoded: TelemetrySampleMessage = match serde_json::from_slice(&message.payload) {
        Ok(decoded) => decoded,
        Err(e) => {
            error!(
                error = %e,
                subject = %message.subject,
                delivery_count = message.delivery_count,
                "failed to decode telemetry sample message"
            );
            return MessageDisposition::Nak(format!("Decode error: {}", e));
        }
    };

    let Some(sample) = decoded.into_new_sample() else {
        warn!(subject = %message.subject, "dropping telemetry sample without condition or weather code");
        return MessageDisposition::Ack;
    };

    match service.ingest(sample).await {
        Ok(outcome) => {
            debug!(
                sample_id = outcome.sample.id,
                insight_stored = outcome.insight.is_some(),
                "telemetry sample ingested"
            );
            MessageDisposition::Ack
        }
        Err(e) if e.is_permanent() => {
            warn!(error = %e, subject = %message.subject, "dropping invalid telemetry sample");
            MessageDisposition::Ack
        }
        Err(e) => {
            warn!(
                error = %e,
                subject = %message.subject,
                delivery_count = message.delivery_count,
                "failed to ingest telemetry sample"
            );
            MessageDisposition::Nak(e.to_string())
        }
    }
}

/// Create a BatchHandler that feeds telemetry sample messages through the ingestion service
pub fn create_telemetry_sample_handler(service: Arc<InsightIngestionService>) -> BatchHandler {
    Box::new(move |messages: Vec<InboundMessage>| {
        let service = Arc::clone(&service);

        Box::pin(async move {
            let mut dispositions = Vec::with_capacity(messages.len());

            // Sequential so samples in a batch are appended in delivery order
            for message in &messages {
                dispositions.push(handle_telemetry_message(&service, message).await);
            }

            dispositions
        })
    })
}
