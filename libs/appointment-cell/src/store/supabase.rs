use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_database::{Filter, SupabaseClient};
use shared_models::error::AppError;

use super::AppointmentStore;
use crate::models::{Appointment, AppointmentStatus, AppointmentUpdate};

const TABLE: &str = "appointments";

/// `appointments` table over PostgREST. Conditional writes carry the expected
/// value as an extra `eq` filter; an empty representation means the swap lost.
pub struct SupabaseAppointmentStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseAppointmentStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    fn patch_body(update: &AppointmentUpdate) -> Result<Value, AppError> {
        let mut body = serde_json::to_value(update)?;
        if let Value::Object(map) = &mut body {
            map.insert("updated_at".to_string(), json!(Utc::now()));
        }
        Ok(body)
    }
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, AppError> {
        self.supabase.select_one(TABLE, &[Filter::eq("id", id)]).await
    }

    async fn create(&self, appointment: Appointment) -> Result<Appointment, AppError> {
        let body = serde_json::to_value(&appointment)?;
        self.supabase.insert(TABLE, body).await
    }

    async fn list_by_status(&self, status: AppointmentStatus) -> Result<Vec<Appointment>, AppError> {
        self.supabase.select(TABLE, &[Filter::eq("status", status)]).await
    }

    async fn list_for_patient(
        &self,
        patient_id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Vec<Appointment>, AppError> {
        self.supabase
            .select(
                TABLE,
                &[Filter::eq("patient_id", patient_id), Filter::eq("status", status)],
            )
            .await
    }

    async fn update_if_status(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        update: AppointmentUpdate,
    ) -> Result<Option<Appointment>, AppError> {
        let rows: Vec<Appointment> = self
            .supabase
            .update_where(
                TABLE,
                &[Filter::eq("id", id), Filter::eq("status", expected)],
                Self::patch_body(&update)?,
            )
            .await?;

        if rows.is_empty() {
            debug!("Conditional update of appointment {} matched no row (expected {})", id, expected);
        }
        Ok(rows.into_iter().next())
    }

    async fn claim_reminder(&self, id: Uuid) -> Result<bool, AppError> {
        let rows: Vec<Value> = self
            .supabase
            .update_where(
                TABLE,
                &[Filter::eq("id", id), Filter::eq("reminder_sent", false)],
                json!({ "reminder_sent": true }),
            )
            .await?;
        Ok(!rows.is_empty())
    }

    async fn release_reminder(&self, id: Uuid) -> Result<(), AppError> {
        let _: Vec<Value> = self
            .supabase
            .update_where(TABLE, &[Filter::eq("id", id)], json!({ "reminder_sent": false }))
            .await?;
        Ok(())
    }
}
