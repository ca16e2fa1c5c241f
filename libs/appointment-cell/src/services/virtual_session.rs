// libs/appointment-cell/src/services/virtual_session.rs
//
// Virtual consultation lifecycle: the doctor starts the session (which puts
// the appointment in progress and tells the patient), participants join while
// it is live, and ending it completes the appointment.

use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use notification_cell::{NotificationDispatcher, NotificationKind, NotificationPayload, Recipient};
use shared_models::auth::Role;
use shared_utils::clock::Clock;
use shared_utils::guard::{AccessPolicy, Actor, Ownership};

use crate::models::{Appointment, AppointmentError, AppointmentStatus, AppointmentUpdate, MeetingAccess};
use crate::store::AppointmentStore;

/// Unlocks the patient's "Join Meeting" action.
pub fn can_join(appointment: &Appointment) -> bool {
    appointment.is_virtual()
        && appointment.session_live()
        && matches!(
            appointment.status,
            AppointmentStatus::Confirmed | AppointmentStatus::InProgress
        )
}

/// Confirmed virtual appointment whose doctor has not started the session yet.
pub fn waiting_for_doctor(appointment: &Appointment) -> bool {
    appointment.is_virtual()
        && !appointment.virtual_session_started
        && appointment.status == AppointmentStatus::Confirmed
}

pub struct VirtualSessionService {
    store: Arc<dyn AppointmentStore>,
    notifier: Arc<NotificationDispatcher>,
    clock: Arc<dyn Clock>,
}

impl VirtualSessionService {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        notifier: Arc<NotificationDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { store, notifier, clock }
    }

    async fn load_virtual(&self, id: Uuid) -> Result<Appointment, AppointmentError> {
        let appointment = self
            .store
            .get(id)
            .await?
            .ok_or(AppointmentError::NotFound(id))?;
        if !appointment.is_virtual() {
            return Err(AppointmentError::NotVirtual(id));
        }
        Ok(appointment)
    }

    fn clinician_policy(appointment: &Appointment, action: &'static str) -> AccessPolicy {
        AccessPolicy::new(action, &[Role::Doctor, Role::Admin])
            .owned_by(Ownership::Doctor(appointment.doctor_id))
    }

    #[instrument(skip(self, actor))]
    pub async fn start_session(
        &self,
        appointment_id: Uuid,
        actor: &Actor,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.load_virtual(appointment_id).await?;
        Self::clinician_policy(&appointment, "start virtual sessions").check(actor)?;

        if appointment.status != AppointmentStatus::Confirmed || appointment.virtual_session_started {
            return Err(AppointmentError::InvalidTransition {
                from: appointment.status,
                to: AppointmentStatus::InProgress,
            });
        }

        let update = AppointmentUpdate {
            status: Some(AppointmentStatus::InProgress),
            virtual_session_started: Some(true),
            session_start_time: Some(self.clock.now_utc()),
            ..AppointmentUpdate::default()
        };

        let started = self
            .store
            .update_if_status(appointment_id, AppointmentStatus::Confirmed, update)
            .await?
            .ok_or_else(|| {
                AppointmentError::SessionNotAvailable("appointment changed before the session started".to_string())
            })?;

        info!("Virtual session started for appointment {}", started.id);

        self.notifier
            .deliver_best_effort(&NotificationPayload::new(
                Recipient::Patient(started.patient_id),
                NotificationKind::VirtualSessionReady,
                started.notification_context(),
            ))
            .await;

        Ok(started)
    }

    /// Ends the live session and completes the appointment.
    #[instrument(skip(self, actor))]
    pub async fn end_session(
        &self,
        appointment_id: Uuid,
        actor: &Actor,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.load_virtual(appointment_id).await?;
        Self::clinician_policy(&appointment, "end virtual sessions").check(actor)?;

        if !appointment.session_live() || appointment.status != AppointmentStatus::InProgress {
            return Err(AppointmentError::SessionNotAvailable(format!(
                "no live session for appointment {}",
                appointment_id
            )));
        }

        let update = AppointmentUpdate {
            status: Some(AppointmentStatus::Completed),
            virtual_session_ended: Some(true),
            session_end_time: Some(self.clock.now_utc()),
            ..AppointmentUpdate::default()
        };

        let ended = self
            .store
            .update_if_status(appointment_id, AppointmentStatus::InProgress, update)
            .await?
            .ok_or_else(|| {
                AppointmentError::SessionNotAvailable("session was already ended".to_string())
            })?;

        info!("Virtual session ended for appointment {}", ended.id);
        Ok(ended)
    }

    /// Room details for a participant. Patients need a live session; the
    /// doctor may enter any time before it has ended.
    pub async fn join_meeting(
        &self,
        appointment_id: Uuid,
        actor: &Actor,
    ) -> Result<MeetingAccess, AppointmentError> {
        let appointment = self.load_virtual(appointment_id).await?;

        AccessPolicy::new("join virtual sessions", &[Role::Patient, Role::Doctor, Role::Admin])
            .owned_by(Ownership::Patient(appointment.patient_id))
            .owned_by(Ownership::Doctor(appointment.doctor_id))
            .check(actor)?;

        let open = match actor.role {
            Role::Patient => can_join(&appointment),
            _ => !appointment.virtual_session_ended && !appointment.status.is_terminal(),
        };
        if !open {
            return Err(AppointmentError::SessionNotAvailable(if waiting_for_doctor(&appointment) {
                "waiting for the doctor to start the session".to_string()
            } else {
                "session is not live".to_string()
            }));
        }

        let meeting_room_id = appointment.meeting_room_id.clone().ok_or_else(|| {
            AppointmentError::SessionNotAvailable("no meeting room assigned".to_string())
        })?;

        Ok(MeetingAccess {
            appointment_id,
            meeting_room_id,
            meeting_link: appointment.meeting_link,
        })
    }
}
