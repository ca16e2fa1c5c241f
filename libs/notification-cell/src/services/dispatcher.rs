use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::error::NotificationError;
use crate::models::{EmailMessage, NotificationPayload, Recipient};
use crate::services::directory::ContactDirectory;
use crate::services::sender::EmailSender;
use crate::templates::TemplateRenderer;

/// Resolves, renders and sends notifications.
///
/// Callers that change business state use the `*_best_effort` methods: a
/// failed send is logged and reported as `false`, never as an error.
pub struct NotificationDispatcher {
    sender: Arc<dyn EmailSender>,
    directory: Arc<dyn ContactDirectory>,
    renderer: TemplateRenderer,
}

impl NotificationDispatcher {
    pub fn new(
        sender: Arc<dyn EmailSender>,
        directory: Arc<dyn ContactDirectory>,
        app_url: impl Into<String>,
    ) -> Self {
        Self {
            sender,
            directory,
            renderer: TemplateRenderer::new(app_url),
        }
    }

    pub async fn deliver(&self, payload: &NotificationPayload) -> Result<(), NotificationError> {
        let contact = match payload.recipient {
            Recipient::Patient(id) => self
                .directory
                .patient_contact(id)
                .await?
                .ok_or(NotificationError::RecipientNotFound { role: "patient", id })?,
            Recipient::Doctor(id) => self
                .directory
                .doctor_contact(id)
                .await?
                .ok_or(NotificationError::RecipientNotFound { role: "doctor", id })?,
        };

        let rendered = self.renderer.render(payload.kind, &payload.context);
        let message = EmailMessage {
            to: contact.email,
            subject: rendered.subject,
            body: rendered.body,
        };

        self.sender.send(&message).await?;
        debug!(
            appointment_id = %payload.context.appointment_id,
            kind = ?payload.kind,
            "Notification sent"
        );
        Ok(())
    }

    pub async fn deliver_best_effort(&self, payload: &NotificationPayload) -> bool {
        match self.deliver(payload).await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    appointment_id = %payload.context.appointment_id,
                    kind = ?payload.kind,
                    "Notification dropped: {}", e
                );
                false
            }
        }
    }

    /// Sends every payload concurrently; returns how many were delivered.
    pub async fn deliver_all_best_effort(&self, payloads: &[NotificationPayload]) -> usize {
        let results = join_all(payloads.iter().map(|p| self.deliver_best_effort(p))).await;
        let delivered = results.into_iter().filter(|ok| *ok).count();
        if delivered < payloads.len() {
            info!("{} of {} notifications delivered", delivered, payloads.len());
        }
        delivered
    }
}
