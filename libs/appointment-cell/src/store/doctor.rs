use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use shared_database::{Filter, SupabaseClient};
use shared_models::error::AppError;

/// The parts of a `doctors` row that booking depends on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorProfile {
    pub id: Uuid,
    pub clinic_id: Option<Uuid>,
    pub verification_status: Option<String>,
}

impl DoctorProfile {
    pub fn is_verified(&self) -> bool {
        self.verification_status.as_deref() == Some("verified")
    }

    pub fn works_at(&self, clinic_id: Uuid) -> bool {
        self.clinic_id == Some(clinic_id)
    }
}

/// Doctor lookups needed before an appointment can be booked.
#[async_trait]
pub trait DoctorDirectory: Send + Sync {
    async fn get_doctor(&self, doctor_id: Uuid) -> Result<Option<DoctorProfile>, AppError>;
}

#[derive(Default)]
pub struct InMemoryDoctorDirectory {
    doctors: RwLock<HashMap<Uuid, DoctorProfile>>,
}

impl InMemoryDoctorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, doctor: DoctorProfile) {
        self.doctors.write().await.insert(doctor.id, doctor);
    }
}

#[async_trait]
impl DoctorDirectory for InMemoryDoctorDirectory {
    async fn get_doctor(&self, doctor_id: Uuid) -> Result<Option<DoctorProfile>, AppError> {
        Ok(self.doctors.read().await.get(&doctor_id).cloned())
    }
}

pub struct SupabaseDoctorDirectory {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseDoctorDirectory {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl DoctorDirectory for SupabaseDoctorDirectory {
    async fn get_doctor(&self, doctor_id: Uuid) -> Result<Option<DoctorProfile>, AppError> {
        self.supabase
            .select_one("doctors", &[Filter::eq("id", doctor_id)])
            .await
    }
}
