use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::guard::{AccessDenied, Actor};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Clinic {
    pub id: Uuid,
    pub name: String,
    pub province: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub registration_code: Option<String>,
    #[serde(default)]
    pub code_used: bool,
    pub admin_user_id: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Clinic {
    /// Lower-cased domain of the clinic's contact address.
    pub fn email_domain(&self) -> Option<String> {
        self.email.as_deref().and_then(email_domain)
    }
}

pub(crate) fn email_domain(email: &str) -> Option<String> {
    email
        .trim()
        .rsplit_once('@')
        .map(|(_, domain)| domain.to_lowercase())
        .filter(|domain| !domain.is_empty())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClinicRequest {
    pub name: String,
    pub province: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Person redeeming a registration code to become a clinic's admin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Registrant {
    pub user_id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
}

impl Registrant {
    /// `None` when the account has no email address to check.
    pub fn from_user(user: &User) -> Option<Self> {
        Some(Self {
            user_id: user.id,
            email: user.email.clone()?,
            full_name: user.full_name.clone(),
        })
    }
}

/// Knobs for [`crate::RegistrationService::redeem_code`].
#[derive(Debug, Clone, Default)]
pub struct RedeemOptions {
    /// Skip the email-domain plausibility check. Only honoured when
    /// `requested_by` is an admin.
    pub override_email_domain: bool,
    pub requested_by: Option<Actor>,
}

impl RedeemOptions {
    pub fn admin_override(admin: Actor) -> Self {
        Self {
            override_email_domain: true,
            requested_by: Some(admin),
        }
    }
}

/// Result of a successful redemption.
#[derive(Debug, Clone, PartialEq)]
pub struct Redemption {
    pub clinic: Clinic,
    pub admin_user_id: Uuid,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClinicError {
    #[error("Clinic not found: {0}")]
    ClinicNotFound(Uuid),

    #[error("This registration code has already been used")]
    CodeAlreadyUsed,

    #[error("Invalid registration code for this clinic")]
    CodeMismatch,

    #[error("Please use your official clinic email address (@{expected})")]
    EmailDomainMismatch { expected: String },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<AccessDenied> for ClinicError {
    fn from(e: AccessDenied) -> Self {
        ClinicError::Forbidden(e.0)
    }
}
