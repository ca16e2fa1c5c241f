use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use shared_models::auth::Role;
use shared_utils::clock::Clock;
use shared_utils::guard::{AccessPolicy, Actor, Ownership};

use crate::models::{Appointment, AppointmentError, AppointmentStatus};
use crate::services::access_window::{hours_until, is_upcoming};
use crate::store::AppointmentStore;

/// Banners the patient closed during this session. Held by the caller and
/// never persisted; it has no effect on reminder emails.
#[derive(Debug, Default, Clone)]
pub struct DismissedSet(HashSet<Uuid>);

impl DismissedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dismiss(&mut self, appointment_id: Uuid) {
        self.0.insert(appointment_id);
    }

    pub fn contains(&self, appointment_id: &Uuid) -> bool {
        self.0.contains(appointment_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpcomingAppointment {
    pub appointment: Appointment,
    pub hours_until: i64,
}

pub struct UpcomingAppointmentsService {
    store: Arc<dyn AppointmentStore>,
    clock: Arc<dyn Clock>,
}

impl UpcomingAppointmentsService {
    pub fn new(store: Arc<dyn AppointmentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Confirmed appointments of `patient_id` due within 48 hours, soonest
    /// first, minus the dismissed ones.
    pub async fn upcoming_for_patient(
        &self,
        actor: &Actor,
        patient_id: Uuid,
        dismissed: &DismissedSet,
    ) -> Result<Vec<UpcomingAppointment>, AppointmentError> {
        AccessPolicy::new("view upcoming appointments", &[Role::Patient, Role::Admin])
            .owned_by(Ownership::Patient(patient_id))
            .check(actor)?;

        let now = self.clock.now();
        let mut upcoming: Vec<UpcomingAppointment> = self
            .store
            .list_for_patient(patient_id, AppointmentStatus::Confirmed)
            .await?
            .into_iter()
            .filter(|a| !dismissed.contains(&a.id) && is_upcoming(a, now))
            .filter_map(|a| {
                hours_until(&a, now).map(|hours_until| UpcomingAppointment {
                    appointment: a,
                    hours_until,
                })
            })
            .collect();

        upcoming.sort_by_key(|u| u.hours_until);
        Ok(upcoming)
    }
}
