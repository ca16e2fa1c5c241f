use std::collections::HashSet;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, error, instrument};

use shared_config::AppConfig;

use crate::error::NotificationError;
use crate::models::EmailMessage;

/// Outbound email transport. Delivery is best-effort: no receipts are modelled.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError>;
}

/// Sends mail through an HTTP email API (JSON body, bearer key).
pub struct HttpEmailSender {
    client: Client,
    api_url: String,
    api_key: String,
    from_address: String,
}

impl HttpEmailSender {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            api_url: config.email_api_url.clone(),
            api_key: config.email_api_key.clone(),
            from_address: config.email_from_address.clone(),
        }
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    #[instrument(skip(self, message), fields(to = %message.to))]
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError> {
        if self.api_url.is_empty() {
            return Err(NotificationError::NotConfigured);
        }

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from_address,
                "to": message.to,
                "subject": message.subject,
                "body": message.body,
            }))
            .send()
            .await
            .map_err(|e| NotificationError::NotificationDeliveryFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Email API error ({}): {}", status, error_text);
            return Err(NotificationError::NotificationDeliveryFailed(format!(
                "email API returned {}: {}",
                status, error_text
            )));
        }

        debug!("Email accepted by provider");
        Ok(())
    }
}

/// In-memory outbox for tests. Nothing leaves the process, so it must not
/// back a running scheduler. Addresses registered with
/// [`RecordingEmailSender::fail_for`] are rejected.
#[derive(Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<EmailMessage>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fail_for(&self, address: &str) {
        self.failing.lock().await.insert(address.to_string());
    }

    pub async fn recover(&self, address: &str) {
        self.failing.lock().await.remove(address);
    }

    pub async fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_to(&self, address: &str) -> Vec<EmailMessage> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|m| m.to == address)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError> {
        if self.failing.lock().await.contains(&message.to) {
            return Err(NotificationError::NotificationDeliveryFailed(format!(
                "mailbox {} rejected the message",
                message.to
            )));
        }
        self.sent.lock().await.push(message.clone());
        Ok(())
    }
}
