use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use redriver_core::{
    DeadLetterNotice, DeadLetterSink, EngineSink, NotifyError, SubmitError,
};

use crate::config::{AlertingConfig, EngineConfig};

#[derive(Serialize)]
struct SubmitRequest<'a> {
    message_id: &'a Uuid,
}

#[derive(Serialize)]
struct DeadLetterRequest {
    message_id: Uuid,
    retry_count: u32,
    scheduled_at: u64,
}

/// Engine emission over HTTP: POSTs the message id to the engine's
/// execution entry point. Runs on the poller thread, so the blocking
/// client is the right shape here.
pub struct HttpEngineSink {
    client: reqwest::blocking::Client,
    submit_url: String,
}

impl HttpEngineSink {
    pub fn new(config: &EngineConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        Ok(Self {
            client,
            submit_url: config.submit_url.clone(),
        })
    }
}

impl EngineSink for HttpEngineSink {
    fn submit(&self, message_id: &Uuid) -> Result<(), SubmitError> {
        let response = self
            .client
            .post(&self.submit_url)
            .json(&SubmitRequest { message_id })
            .send()
            .map_err(|e| SubmitError::Unavailable(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(SubmitError::Rejected(format!(
                "engine returned {}",
                response.status()
            )))
        }
    }
}

/// Dead-letter notices POSTed to an ops webhook.
pub struct WebhookDeadLetterSink {
    client: reqwest::blocking::Client,
    webhook_url: String,
}

impl WebhookDeadLetterSink {
    /// `None` when no webhook is configured — callers fall back to the
    /// log-based sink.
    pub fn from_config(config: &AlertingConfig) -> Result<Option<Self>, reqwest::Error> {
        let Some(url) = config.webhook_url.clone() else {
            return Ok(None);
        };
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Some(Self {
            client,
            webhook_url: url,
        }))
    }
}

impl DeadLetterSink for WebhookDeadLetterSink {
    fn notify(&self, notice: &DeadLetterNotice) -> Result<(), NotifyError> {
        let body = DeadLetterRequest {
            message_id: notice.message_id,
            retry_count: notice.retry_count,
            scheduled_at: notice.scheduled_at,
        };
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&body)
            .send()
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(NotifyError::Delivery(format!(
                "webhook returned {}",
                response.status()
            )))
        }
    }
}
