// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use notification_cell::{NotificationDispatcher, NotificationKind, NotificationPayload, Recipient};
use shared_models::auth::Role;
use shared_models::error::AppError;
use shared_utils::clock::Clock;
use shared_utils::guard::{AccessPolicy, Actor, Ownership};
use shared_utils::token::timestamped_token;

use crate::models::{
    parse_time_of_day, Appointment, AppointmentError, AppointmentStatus, AppointmentType,
    AppointmentUpdate, BookAppointmentRequest, RescheduleRequest,
};
use crate::services::access_window::{can_cancel, can_edit};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::store::{AppointmentStore, DoctorDirectory};

const MEETING_ROOM_PREFIX: &str = "ncbs-consult";
const MEETING_BASE_URL: &str = "https://8x8.vc/ncbs";

/// Conditional writes attempted before a transition gives up on a row that
/// keeps changing underneath it.
const TRANSITION_ATTEMPTS: usize = 2;

/// Booking, rescheduling and status changes requested by people.
pub struct AppointmentService {
    store: Arc<dyn AppointmentStore>,
    doctors: Arc<dyn DoctorDirectory>,
    notifier: Arc<NotificationDispatcher>,
    clock: Arc<dyn Clock>,
    lifecycle: AppointmentLifecycleService,
}

impl AppointmentService {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        doctors: Arc<dyn DoctorDirectory>,
        notifier: Arc<NotificationDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            doctors,
            notifier,
            clock,
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    async fn load(&self, id: Uuid) -> Result<Appointment, AppointmentError> {
        self.store
            .get(id)
            .await?
            .ok_or(AppointmentError::NotFound(id))
    }

    /// Read an appointment the actor is a party to.
    pub async fn get_appointment(&self, id: Uuid, actor: &Actor) -> Result<Appointment, AppointmentError> {
        let appointment = self.load(id).await?;
        AccessPolicy::new("view this appointment", &[Role::Patient, Role::Doctor, Role::ClinicAdmin, Role::Admin])
            .owned_by(Ownership::Patient(appointment.patient_id))
            .owned_by(Ownership::Doctor(appointment.doctor_id))
            .owned_by(Ownership::Clinic(appointment.clinic_id))
            .check(actor)?;
        Ok(appointment)
    }

    /// The doctor must exist, be verified and practise at the chosen clinic.
    async fn ensure_bookable_doctor(&self, doctor_id: Uuid, clinic_id: Uuid) -> Result<(), AppointmentError> {
        let doctor = self.doctors.get_doctor(doctor_id).await?.ok_or_else(|| {
            AppointmentError::ValidationError(format!("doctor {} not found", doctor_id))
        })?;

        if !doctor.is_verified() {
            return Err(AppointmentError::ValidationError(format!(
                "doctor {} is not verified",
                doctor_id
            )));
        }
        if !doctor.works_at(clinic_id) {
            return Err(AppointmentError::ValidationError(format!(
                "doctor {} does not practise at clinic {}",
                doctor_id, clinic_id
            )));
        }
        Ok(())
    }

    /// Create a pending appointment for the acting patient.
    #[instrument(skip(self, request), fields(doctor_id = %request.doctor_id))]
    pub async fn book_appointment(
        &self,
        actor: &Actor,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        AccessPolicy::new("book appointments", &[Role::Patient]).check(actor)?;
        let patient_id = actor
            .profile_id
            .ok_or_else(|| AppointmentError::ValidationError("patient profile is not set up".to_string()))?;

        if request.patient_name.trim().is_empty() || request.doctor_name.trim().is_empty() {
            return Err(AppointmentError::ValidationError(
                "patient and doctor names are required".to_string(),
            ));
        }

        let start = request.appointment_date.and_time(parse_time_of_day(&request.appointment_time)?);
        if start <= self.clock.now() {
            return Err(AppointmentError::InvalidTime(
                "Appointment must be scheduled for a future time".to_string(),
            ));
        }

        self.ensure_bookable_doctor(request.doctor_id, request.clinic_id).await?;

        let (meeting_room_id, meeting_link) = match request.appointment_type {
            AppointmentType::Virtual => {
                let room = timestamped_token(MEETING_ROOM_PREFIX, self.clock.now_utc().timestamp_millis(), 9);
                let link = format!("{}/{}", MEETING_BASE_URL, room);
                (Some(room), Some(link))
            }
            AppointmentType::InPerson => (None, None),
        };

        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id,
            doctor_id: request.doctor_id,
            clinic_id: request.clinic_id,
            patient_name: request.patient_name,
            doctor_name: request.doctor_name,
            clinic_name: request.clinic_name,
            appointment_date: request.appointment_date,
            appointment_time: request.appointment_time.trim().to_string(),
            appointment_type: request.appointment_type,
            status: AppointmentStatus::Pending,
            reason: request.reason,
            meeting_room_id,
            meeting_link,
            virtual_session_started: false,
            virtual_session_ended: false,
            session_start_time: None,
            session_end_time: None,
            reminder_sent: false,
            created_at: None,
            updated_at: None,
        };

        let created = self.store.create(appointment).await?;
        info!("Appointment {} booked for patient {}", created.id, created.patient_id);

        self.notifier
            .deliver_best_effort(&NotificationPayload::new(
                Recipient::Patient(created.patient_id),
                NotificationKind::BookingReceived,
                created.notification_context(),
            ))
            .await;

        Ok(created)
    }

    /// Move an appointment to `target`. The write is conditional on the status
    /// that was authorized. When another request changes the row first, the
    /// transition is authorized again against the fresh status: an edge that
    /// is no longer legal fails as such, a still-legal one is retried.
    #[instrument(skip(self, actor), fields(role = %actor.role))]
    pub async fn request_transition(
        &self,
        appointment_id: Uuid,
        actor: &Actor,
        target: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        for attempt in 1..=TRANSITION_ATTEMPTS {
            let appointment = self.load(appointment_id).await?;

            self.lifecycle.authorize_transition(&appointment, actor, target)?;

            if target == AppointmentStatus::InProgress && appointment.is_virtual() {
                // Virtual visits go live through the session start action.
                return Err(AppointmentError::InvalidTransition {
                    from: appointment.status,
                    to: target,
                });
            }

            let mut update = AppointmentUpdate::status(target);
            if target == AppointmentStatus::Completed && appointment.session_live() {
                update.virtual_session_ended = Some(true);
                update.session_end_time = Some(self.clock.now_utc());
            }

            let Some(updated) = self
                .store
                .update_if_status(appointment.id, appointment.status, update)
                .await?
            else {
                warn!(
                    "Appointment {} changed while moving {} -> {} (attempt {})",
                    appointment_id, appointment.status, target, attempt
                );
                continue;
            };

            info!(
                "Appointment {} moved {} -> {} by {}",
                updated.id, appointment.status, updated.status, actor.role
            );

            self.notify_status_change(&updated, actor).await;
            return Ok(updated);
        }

        Err(AppointmentError::Store(AppError::Conflict(format!(
            "appointment {} kept changing while moving to {}",
            appointment_id, target
        ))))
    }

    /// Cancel on behalf of the actor. Same as a transition to `cancelled`,
    /// with the status pre-check the UI uses to offer the control.
    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        actor: &Actor,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.load(appointment_id).await?;
        if !can_cancel(&appointment) {
            return Err(AppointmentError::InvalidTransition {
                from: appointment.status,
                to: AppointmentStatus::Cancelled,
            });
        }
        self.request_transition(appointment_id, actor, AppointmentStatus::Cancelled)
            .await
    }

    /// Change date and time of a pending appointment at least 24 hours out.
    /// Status and participants are never touched.
    #[instrument(skip(self, actor, request))]
    pub async fn edit_appointment(
        &self,
        appointment_id: Uuid,
        actor: &Actor,
        request: RescheduleRequest,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.load(appointment_id).await?;

        AccessPolicy::new("reschedule appointments", &[Role::Patient, Role::Admin])
            .owned_by(Ownership::Patient(appointment.patient_id))
            .check(actor)?;

        let now = self.clock.now();
        if !can_edit(&appointment, now) {
            return Err(AppointmentError::EditNotAllowed(format!(
                "status is {} and changes close {} hours before the visit",
                appointment.status,
                crate::services::access_window::EDIT_CUTOFF_HOURS
            )));
        }

        let new_start = request.appointment_date.and_time(parse_time_of_day(&request.appointment_time)?);
        if new_start <= now {
            return Err(AppointmentError::InvalidTime(
                "Appointment must be scheduled for a future time".to_string(),
            ));
        }

        let update = AppointmentUpdate::reschedule(
            request.appointment_date,
            request.appointment_time.trim().to_string(),
        );

        match self
            .store
            .update_if_status(appointment.id, AppointmentStatus::Pending, update)
            .await?
        {
            Some(updated) => {
                info!(
                    "Appointment {} rescheduled to {} {}",
                    updated.id, updated.appointment_date, updated.appointment_time
                );
                Ok(updated)
            }
            None => Err(AppointmentError::EditNotAllowed(
                "appointment is no longer pending".to_string(),
            )),
        }
    }

    async fn notify_status_change(&self, appointment: &Appointment, actor: &Actor) {
        let kind = match appointment.status {
            AppointmentStatus::Confirmed => NotificationKind::AppointmentConfirmed,
            AppointmentStatus::Cancelled if actor.role == Role::Patient => NotificationKind::AppointmentCancelled,
            AppointmentStatus::Cancelled => NotificationKind::AppointmentDeclined,
            _ => return,
        };

        self.notifier
            .deliver_best_effort(&NotificationPayload::new(
                Recipient::Patient(appointment.patient_id),
                kind,
                appointment.notification_context(),
            ))
            .await;
    }
}
