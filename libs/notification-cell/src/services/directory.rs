use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use shared_database::{Filter, SupabaseClient};
use shared_models::error::AppError;

use crate::models::Contact;

/// Resolves patient and doctor profile ids to mailing addresses.
#[async_trait]
pub trait ContactDirectory: Send + Sync {
    async fn patient_contact(&self, patient_id: Uuid) -> Result<Option<Contact>, AppError>;
    async fn doctor_contact(&self, doctor_id: Uuid) -> Result<Option<Contact>, AppError>;
}

#[derive(Default)]
pub struct InMemoryContactDirectory {
    patients: RwLock<HashMap<Uuid, Contact>>,
    doctors: RwLock<HashMap<Uuid, Contact>>,
}

impl InMemoryContactDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_patient(&self, patient_id: Uuid, contact: Contact) {
        self.patients.write().await.insert(patient_id, contact);
    }

    pub async fn add_doctor(&self, doctor_id: Uuid, contact: Contact) {
        self.doctors.write().await.insert(doctor_id, contact);
    }
}

#[async_trait]
impl ContactDirectory for InMemoryContactDirectory {
    async fn patient_contact(&self, patient_id: Uuid) -> Result<Option<Contact>, AppError> {
        Ok(self.patients.read().await.get(&patient_id).cloned())
    }

    async fn doctor_contact(&self, doctor_id: Uuid) -> Result<Option<Contact>, AppError> {
        Ok(self.doctors.read().await.get(&doctor_id).cloned())
    }
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    user_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct UserRow {
    email: Option<String>,
    full_name: Option<String>,
}

/// Looks up `patients` / `doctors` rows and follows `user_id` into `users`.
pub struct SupabaseContactDirectory {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseContactDirectory {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    async fn contact_for(&self, table: &str, profile_id: Uuid) -> Result<Option<Contact>, AppError> {
        let profile: Option<ProfileRow> = self
            .supabase
            .select_one(table, &[Filter::eq("id", profile_id)])
            .await?;
        let Some(profile) = profile else {
            return Ok(None);
        };

        let user: Option<UserRow> = self
            .supabase
            .select_one("users", &[Filter::eq("id", profile.user_id)])
            .await?;

        Ok(user.and_then(|u| {
            u.email.map(|email| Contact {
                name: u.full_name,
                email,
            })
        }))
    }
}

#[async_trait]
impl ContactDirectory for SupabaseContactDirectory {
    async fn patient_contact(&self, patient_id: Uuid) -> Result<Option<Contact>, AppError> {
        self.contact_for("patients", patient_id).await
    }

    async fn doctor_contact(&self, doctor_id: Uuid) -> Result<Option<Contact>, AppError> {
        self.contact_for("doctors", doctor_id).await
    }
}
