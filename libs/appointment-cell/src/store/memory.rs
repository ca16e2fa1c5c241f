use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use shared_models::error::AppError;

use super::AppointmentStore;
use crate::models::{Appointment, AppointmentStatus, AppointmentUpdate};

/// Process-local store. Each call holds the map lock for its whole
/// read-modify-write, which gives the same guarantees as the conditional
/// updates of the hosted store.
#[derive(Default)]
pub struct InMemoryAppointmentStore {
    rows: Mutex<HashMap<Uuid, Appointment>>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, appointment: Appointment) {
        self.rows.lock().await.insert(appointment.id, appointment);
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, AppError> {
        Ok(self.rows.lock().await.get(&id).cloned())
    }

    async fn create(&self, mut appointment: Appointment) -> Result<Appointment, AppError> {
        let mut rows = self.rows.lock().await;
        if rows.contains_key(&appointment.id) {
            return Err(AppError::Conflict(format!("appointment {} already exists", appointment.id)));
        }
        let now = Utc::now();
        appointment.created_at.get_or_insert(now);
        appointment.updated_at = Some(now);
        rows.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn list_by_status(&self, status: AppointmentStatus) -> Result<Vec<Appointment>, AppError> {
        Ok(self
            .rows
            .lock()
            .await
            .values()
            .filter(|a| a.status == status)
            .cloned()
            .collect())
    }

    async fn list_for_patient(
        &self,
        patient_id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Vec<Appointment>, AppError> {
        Ok(self
            .rows
            .lock()
            .await
            .values()
            .filter(|a| a.patient_id == patient_id && a.status == status)
            .cloned()
            .collect())
    }

    async fn update_if_status(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        update: AppointmentUpdate,
    ) -> Result<Option<Appointment>, AppError> {
        let mut rows = self.rows.lock().await;
        match rows.get_mut(&id) {
            Some(row) if row.status == expected => {
                update.apply(row);
                Ok(Some(row.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn claim_reminder(&self, id: Uuid) -> Result<bool, AppError> {
        let mut rows = self.rows.lock().await;
        match rows.get_mut(&id) {
            Some(row) if !row.reminder_sent => {
                row.reminder_sent = true;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(AppError::NotFound(format!("appointment {}", id))),
        }
    }

    async fn release_reminder(&self, id: Uuid) -> Result<(), AppError> {
        if let Some(row) = self.rows.lock().await.get_mut(&id) {
            row.reminder_sent = false;
        }
        Ok(())
    }
}
