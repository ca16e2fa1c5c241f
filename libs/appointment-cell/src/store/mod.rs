mod doctor;
mod memory;
mod supabase;

pub use doctor::{DoctorDirectory, DoctorProfile, InMemoryDoctorDirectory, SupabaseDoctorDirectory};
pub use memory::InMemoryAppointmentStore;
pub use supabase::SupabaseAppointmentStore;

use async_trait::async_trait;
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{Appointment, AppointmentStatus, AppointmentUpdate};

/// Access to appointment rows in the hosted store.
///
/// Every mutating call is conditional so that two requests racing on the
/// same row cannot both win.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, AppError>;

    async fn create(&self, appointment: Appointment) -> Result<Appointment, AppError>;

    async fn list_by_status(&self, status: AppointmentStatus) -> Result<Vec<Appointment>, AppError>;

    async fn list_for_patient(
        &self,
        patient_id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Vec<Appointment>, AppError>;

    /// Applies `update` only while the row's status still equals `expected`.
    /// `None` means the row is missing or its status moved on.
    async fn update_if_status(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        update: AppointmentUpdate,
    ) -> Result<Option<Appointment>, AppError>;

    /// Flips `reminder_sent` from false to true. `false` if it was already set.
    async fn claim_reminder(&self, id: Uuid) -> Result<bool, AppError>;

    async fn release_reminder(&self, id: Uuid) -> Result<(), AppError>;
}
