use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use shared_models::auth::Role;
use shared_models::error::AppError;

use super::ClinicStore;
use crate::models::Clinic;

/// Role grants recorded by [`InMemoryClinicStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleGrant {
    pub role: Role,
    pub clinic_id: Uuid,
}

#[derive(Default)]
pub struct InMemoryClinicStore {
    clinics: Mutex<HashMap<Uuid, Clinic>>,
    grants: Mutex<HashMap<Uuid, RoleGrant>>,
}

impl InMemoryClinicStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, clinic: Clinic) {
        self.clinics.lock().await.insert(clinic.id, clinic);
    }

    pub async fn grant_for(&self, user_id: Uuid) -> Option<RoleGrant> {
        self.grants.lock().await.get(&user_id).copied()
    }
}

#[async_trait]
impl ClinicStore for InMemoryClinicStore {
    async fn get(&self, id: Uuid) -> Result<Option<Clinic>, AppError> {
        Ok(self.clinics.lock().await.get(&id).cloned())
    }

    async fn create(&self, mut clinic: Clinic) -> Result<Clinic, AppError> {
        let mut clinics = self.clinics.lock().await;
        if clinics.contains_key(&clinic.id) {
            return Err(AppError::Conflict(format!("clinic {} already exists", clinic.id)));
        }
        let now = Utc::now();
        clinic.created_at.get_or_insert(now);
        clinic.updated_at = Some(now);
        clinics.insert(clinic.id, clinic.clone());
        Ok(clinic)
    }

    async fn set_registration_code(&self, id: Uuid, code: &str) -> Result<Option<Clinic>, AppError> {
        let mut clinics = self.clinics.lock().await;
        match clinics.get_mut(&id) {
            Some(clinic) if !clinic.code_used => {
                clinic.registration_code = Some(code.to_string());
                clinic.updated_at = Some(Utc::now());
                Ok(Some(clinic.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn redeem_if_unused(
        &self,
        id: Uuid,
        code: &str,
        admin_user_id: Uuid,
    ) -> Result<Option<Clinic>, AppError> {
        // Lock order: clinics, then grants.
        let mut clinics = self.clinics.lock().await;
        let Some(clinic) = clinics.get_mut(&id) else {
            return Ok(None);
        };
        if clinic.code_used || clinic.registration_code.as_deref() != Some(code) {
            return Ok(None);
        }

        clinic.code_used = true;
        clinic.admin_user_id = Some(admin_user_id);
        clinic.updated_at = Some(Utc::now());
        let redeemed = clinic.clone();

        self.grants.lock().await.insert(
            admin_user_id,
            RoleGrant { role: Role::ClinicAdmin, clinic_id: id },
        );
        Ok(Some(redeemed))
    }
}
