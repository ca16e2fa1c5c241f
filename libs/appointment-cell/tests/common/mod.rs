#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use appointment_cell::*;
use notification_cell::{Contact, EmailSender, InMemoryContactDirectory, NotificationDispatcher, RecordingEmailSender};
use shared_utils::clock::FixedClock;
use shared_utils::guard::Actor;

pub const PATIENT_EMAIL: &str = "lerato@example.com";
pub const DOCTOR_EMAIL: &str = "dr.mahlangu@alexhealth.org.za";

pub struct Harness {
    pub store: Arc<InMemoryAppointmentStore>,
    pub doctors: Arc<InMemoryDoctorDirectory>,
    pub sender: Arc<RecordingEmailSender>,
    pub directory: Arc<InMemoryContactDirectory>,
    pub clock: Arc<FixedClock>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub clinic_id: Uuid,
}

impl Harness {
    pub async fn new(now: NaiveDateTime) -> Self {
        let sender = Arc::new(RecordingEmailSender::new());
        Self::with_sender(now, sender.clone(), sender).await
    }

    /// Harness whose dispatcher sends through `transport`; `sender` is kept
    /// for assertions and may be unrelated to the transport.
    pub async fn with_sender(
        now: NaiveDateTime,
        sender: Arc<RecordingEmailSender>,
        transport: Arc<dyn EmailSender>,
    ) -> Self {
        let patient_id = Uuid::new_v4();
        let doctor_id = Uuid::new_v4();
        let directory = Arc::new(InMemoryContactDirectory::new());
        directory
            .add_patient(patient_id, Contact { name: Some("Lerato Khumalo".to_string()), email: PATIENT_EMAIL.to_string() })
            .await;
        directory
            .add_doctor(doctor_id, Contact { name: Some("Dr Mahlangu".to_string()), email: DOCTOR_EMAIL.to_string() })
            .await;

        let clinic_id = Uuid::new_v4();
        let doctors = Arc::new(InMemoryDoctorDirectory::new());
        doctors
            .insert(DoctorProfile {
                id: doctor_id,
                clinic_id: Some(clinic_id),
                verification_status: Some("verified".to_string()),
            })
            .await;

        let dispatcher = Arc::new(NotificationDispatcher::new(
            transport,
            directory.clone(),
            "https://app.test.clinic",
        ));

        Self {
            store: Arc::new(InMemoryAppointmentStore::new()),
            doctors,
            sender,
            directory,
            clock: Arc::new(FixedClock::new(now)),
            dispatcher,
            patient_id,
            doctor_id,
            clinic_id,
        }
    }

    pub fn service(&self) -> AppointmentService {
        AppointmentService::new(
            self.store.clone(),
            self.doctors.clone(),
            self.dispatcher.clone(),
            self.clock.clone(),
        )
    }

    pub fn sessions(&self) -> VirtualSessionService {
        VirtualSessionService::new(self.store.clone(), self.dispatcher.clone(), self.clock.clone())
    }

    pub fn scanner(&self) -> ReminderScanner {
        ReminderScanner::new(self.store.clone(), self.dispatcher.clone(), self.clock.clone())
    }

    pub fn patient(&self) -> Actor {
        Actor::patient(Uuid::new_v4(), self.patient_id)
    }

    pub fn doctor(&self) -> Actor {
        Actor::doctor(Uuid::new_v4(), self.doctor_id)
    }

    pub fn admin(&self) -> Actor {
        Actor::admin(Uuid::new_v4())
    }

    pub fn appointment(&self, status: AppointmentStatus, date: NaiveDate, time: &str) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            patient_id: self.patient_id,
            doctor_id: self.doctor_id,
            clinic_id: self.clinic_id,
            patient_name: "Lerato Khumalo".to_string(),
            doctor_name: "Mahlangu".to_string(),
            clinic_name: Some("Alexandra Health Centre".to_string()),
            appointment_date: date,
            appointment_time: time.to_string(),
            appointment_type: AppointmentType::InPerson,
            status,
            reason: Some("Persistent cough".to_string()),
            meeting_room_id: None,
            meeting_link: None,
            virtual_session_started: false,
            virtual_session_ended: false,
            session_start_time: None,
            session_end_time: None,
            reminder_sent: false,
            created_at: None,
            updated_at: None,
        }
    }

    pub async fn seed(&self, appointment: Appointment) -> Appointment {
        self.store.insert(appointment.clone()).await;
        appointment
    }

    pub async fn stored(&self, id: Uuid) -> Appointment {
        self.store.get(id).await.unwrap().expect("appointment exists")
    }
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}
