use thiserror::Error;

/// Failures of the infrastructure the cells sit on: the hosted entity store
/// and outbound HTTP integrations. Business rule violations live in each
/// cell's own error type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("serialization failed: {}", err))
    }
}
