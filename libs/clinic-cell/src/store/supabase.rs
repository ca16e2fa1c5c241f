use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, error};
use uuid::Uuid;

use shared_database::{Filter, SupabaseClient};
use shared_models::auth::Role;
use shared_models::error::AppError;

use super::ClinicStore;
use crate::models::Clinic;

const CLINICS: &str = "clinics";
const USERS: &str = "users";

pub struct SupabaseClinicStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseClinicStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl ClinicStore for SupabaseClinicStore {
    async fn get(&self, id: Uuid) -> Result<Option<Clinic>, AppError> {
        self.supabase.select_one(CLINICS, &[Filter::eq("id", id)]).await
    }

    async fn create(&self, clinic: Clinic) -> Result<Clinic, AppError> {
        let body = serde_json::to_value(&clinic)?;
        self.supabase.insert(CLINICS, body).await
    }

    async fn set_registration_code(&self, id: Uuid, code: &str) -> Result<Option<Clinic>, AppError> {
        let rows: Vec<Clinic> = self
            .supabase
            .update_where(
                CLINICS,
                &[Filter::eq("id", id), Filter::eq("code_used", false)],
                json!({
                    "registration_code": code,
                    "updated_at": Utc::now(),
                }),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn redeem_if_unused(
        &self,
        id: Uuid,
        code: &str,
        admin_user_id: Uuid,
    ) -> Result<Option<Clinic>, AppError> {
        let rows: Vec<Clinic> = self
            .supabase
            .update_where(
                CLINICS,
                &[
                    Filter::eq("id", id),
                    Filter::eq("code_used", false),
                    Filter::eq("registration_code", code),
                ],
                json!({
                    "code_used": true,
                    "admin_user_id": admin_user_id,
                    "updated_at": Utc::now(),
                }),
            )
            .await?;

        let Some(clinic) = rows.into_iter().next() else {
            debug!("Redemption of clinic {} matched no unused code", id);
            return Ok(None);
        };

        // The clinic row is already ours; a failed grant leaves it claimed
        // for this user and has to be repaired by an admin.
        let granted: Vec<Value> = self
            .supabase
            .update_where(
                USERS,
                &[Filter::eq("id", admin_user_id)],
                json!({
                    "role": Role::ClinicAdmin.to_string(),
                    "clinic_id": id,
                }),
            )
            .await
            .map_err(|e| {
                error!("Clinic {} redeemed but role grant for {} failed: {}", id, admin_user_id, e);
                e
            })?;

        if granted.is_empty() {
            error!("Clinic {} redeemed but user {} does not exist", id, admin_user_id);
            return Err(AppError::NotFound(format!("user {}", admin_user_id)));
        }

        Ok(Some(clinic))
    }
}
