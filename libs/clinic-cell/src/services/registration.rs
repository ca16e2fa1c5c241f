// libs/clinic-cell/src/services/registration.rs
use std::sync::Arc;

use chrono::Utc;
use regex::Regex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use shared_models::auth::Role;
use shared_utils::guard::{AccessPolicy, Actor};
use shared_utils::token::random_base36;

use crate::models::{email_domain, Clinic, ClinicError, CreateClinicRequest, RedeemOptions, Redemption, Registrant};
use crate::store::ClinicStore;

pub const CODE_PREFIX: &str = "CLINIC";
const CODE_SUFFIX_LEN: usize = 9;

/// Substrings that make a registrant's email domain plausible for any clinic.
pub const PROFESSIONAL_DOMAIN_MARKERS: [&str; 4] = ["health", "hospital", "clinic", "medical"];

/// `CLINIC-<unix millis>-<9 upper-case base36 chars>`.
pub fn generate_registration_code(unix_millis: i64) -> String {
    format!(
        "{}-{}-{}",
        CODE_PREFIX,
        unix_millis,
        random_base36(CODE_SUFFIX_LEN).to_uppercase()
    )
}

/// Form input is upper-cased as it is typed, so compare the same way.
pub fn normalize_code(submitted: &str) -> String {
    submitted.trim().to_uppercase()
}

/// Soft plausibility check on a registrant's address. Passes when the domain
/// matches the clinic's own, or looks like a healthcare domain. This only
/// filters typos and obvious personal mailboxes; anyone holding the code can
/// still register from a domain containing one of the markers.
pub fn email_domain_plausible(registrant_domain: &str, clinic_domain: &str) -> bool {
    registrant_domain == clinic_domain
        || PROFESSIONAL_DOMAIN_MARKERS
            .iter()
            .any(|marker| registrant_domain.contains(marker))
}

/// Single-use registration codes that onboard one clinic admin per clinic.
pub struct RegistrationService {
    store: Arc<dyn ClinicStore>,
    code_pattern: Regex,
    email_pattern: Regex,
}

impl RegistrationService {
    pub fn new(store: Arc<dyn ClinicStore>) -> Result<Self, ClinicError> {
        let code_pattern = Regex::new(r"^CLINIC-\d+-[A-Z0-9]+$")
            .map_err(|e| ClinicError::Validation(e.to_string()))?;
        let email_pattern = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
            .map_err(|e| ClinicError::Validation(e.to_string()))?;

        Ok(Self {
            store,
            code_pattern,
            email_pattern,
        })
    }

    /// Creates a clinic with a fresh, unused registration code.
    #[instrument(skip(self, actor, request), fields(name = %request.name))]
    pub async fn create_clinic(
        &self,
        actor: &Actor,
        request: CreateClinicRequest,
    ) -> Result<Clinic, ClinicError> {
        AccessPolicy::new("create clinics", &[Role::Admin]).check(actor)?;

        if request.name.trim().is_empty() {
            return Err(ClinicError::Validation("clinic name is required".to_string()));
        }
        if let Some(email) = request.email.as_deref() {
            if !self.email_pattern.is_match(email.trim()) {
                return Err(ClinicError::Validation(format!("invalid clinic email: {}", email)));
            }
        }

        let clinic = Clinic {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            province: request.province,
            city: request.city,
            address: request.address,
            phone: request.phone,
            email: request.email.map(|e| e.trim().to_string()),
            registration_code: Some(generate_registration_code(Utc::now().timestamp_millis())),
            code_used: false,
            admin_user_id: None,
            created_at: None,
            updated_at: None,
        };

        let created = self.store.create(clinic).await?;
        info!("Clinic {} created", created.id);
        Ok(created)
    }

    /// Issues a new code, replacing an unredeemed one. Once a code has been
    /// redeemed it stays bound to its admin.
    #[instrument(skip(self, actor))]
    pub async fn issue_code(&self, actor: &Actor, clinic_id: Uuid) -> Result<String, ClinicError> {
        AccessPolicy::new("issue registration codes", &[Role::Admin]).check(actor)?;

        let code = generate_registration_code(Utc::now().timestamp_millis());
        match self.store.set_registration_code(clinic_id, &code).await? {
            Some(_) => {
                info!("Registration code issued for clinic {}", clinic_id);
                Ok(code)
            }
            None => match self.store.get(clinic_id).await? {
                None => Err(ClinicError::ClinicNotFound(clinic_id)),
                Some(_) => Err(ClinicError::CodeAlreadyUsed),
            },
        }
    }

    /// Redeems `submitted_code` for `clinic_id`, making `registrant` the
    /// clinic's admin. At most one redemption per code succeeds, however many
    /// race for it.
    ///
    /// The registrant holds no role until this succeeds, so no role policy
    /// runs here: the single-use code is the credential. Only the
    /// email-domain override is checked, against `options.requested_by`.
    #[instrument(skip(self, submitted_code, registrant, options), fields(user_id = %registrant.user_id))]
    pub async fn redeem_code(
        &self,
        clinic_id: Uuid,
        submitted_code: &str,
        registrant: &Registrant,
        options: RedeemOptions,
    ) -> Result<Redemption, ClinicError> {
        if options.override_email_domain {
            let admin = options.requested_by.as_ref().ok_or_else(|| {
                ClinicError::Forbidden("email-domain override needs an admin".to_string())
            })?;
            AccessPolicy::new("override the clinic email-domain check", &[Role::Admin]).check(admin)?;
        }

        let clinic = self
            .store
            .get(clinic_id)
            .await?
            .ok_or(ClinicError::ClinicNotFound(clinic_id))?;

        if clinic.code_used {
            return Err(ClinicError::CodeAlreadyUsed);
        }

        let code = normalize_code(submitted_code);
        if clinic.registration_code.as_deref() != Some(code.as_str()) {
            return Err(ClinicError::CodeMismatch);
        }
        if !self.code_pattern.is_match(&code) {
            warn!("Clinic {} holds a code outside the issued format", clinic_id);
        }

        self.check_email_domain(&clinic, registrant, options.override_email_domain)?;

        match self
            .store
            .redeem_if_unused(clinic_id, &code, registrant.user_id)
            .await?
        {
            Some(clinic) => {
                info!("Clinic {} redeemed by user {}", clinic_id, registrant.user_id);
                Ok(Redemption {
                    clinic,
                    admin_user_id: registrant.user_id,
                })
            }
            None => Err(self.lost_redemption(clinic_id).await?),
        }
    }

    fn check_email_domain(
        &self,
        clinic: &Clinic,
        registrant: &Registrant,
        overridden: bool,
    ) -> Result<(), ClinicError> {
        let email = registrant.email.trim();
        if !self.email_pattern.is_match(email) {
            return Err(ClinicError::Validation(format!("invalid email address: {}", email)));
        }

        let Some(clinic_domain) = clinic.email_domain() else {
            return Ok(());
        };
        let registrant_domain = email_domain(email).unwrap_or_default();

        if email_domain_plausible(&registrant_domain, &clinic_domain) {
            return Ok(());
        }
        if overridden {
            warn!(
                clinic_id = %clinic.id,
                registrant_domain = %registrant_domain,
                "Email-domain check overridden by admin"
            );
            return Ok(());
        }
        Err(ClinicError::EmailDomainMismatch { expected: clinic_domain })
    }

    /// The conditional write missed: either someone redeemed first or the
    /// code was re-issued in between.
    async fn lost_redemption(&self, clinic_id: Uuid) -> Result<ClinicError, ClinicError> {
        Ok(match self.store.get(clinic_id).await? {
            None => ClinicError::ClinicNotFound(clinic_id),
            Some(current) if current.code_used => ClinicError::CodeAlreadyUsed,
            Some(_) => ClinicError::CodeMismatch,
        })
    }
}
