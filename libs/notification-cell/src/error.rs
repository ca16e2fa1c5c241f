use thiserror::Error;
use uuid::Uuid;

use shared_models::error::AppError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NotificationError {
    #[error("Notification delivery failed: {0}")]
    NotificationDeliveryFailed(String),

    #[error("No contact address for {role} {id}")]
    RecipientNotFound { role: &'static str, id: Uuid },

    #[error("Email transport not configured")]
    NotConfigured,

    #[error("Directory lookup failed: {0}")]
    Directory(#[from] AppError),
}
