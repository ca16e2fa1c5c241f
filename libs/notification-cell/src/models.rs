use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A rendered email, ready for the transport.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contact {
    pub name: Option<String>,
    pub email: String,
}

/// Who a notification is addressed to, by profile record id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    Patient(Uuid),
    Doctor(Uuid),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BookingReceived,
    AppointmentConfirmed,
    /// Cancelled by the doctor or an administrator.
    AppointmentDeclined,
    /// Cancelled by the patient.
    AppointmentCancelled,
    PatientReminder,
    DoctorReminder,
    VirtualSessionReady,
}

/// Appointment facts a template may refer to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentContext {
    pub appointment_id: Uuid,
    pub patient_name: String,
    pub doctor_name: String,
    pub clinic_name: Option<String>,
    pub date: NaiveDate,
    pub time: String,
    pub is_virtual: bool,
    pub reason: Option<String>,
    pub meeting_link: Option<String>,
}

/// Structured notification: the triggering rule builds this, templates render it.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationPayload {
    pub recipient: Recipient,
    pub kind: NotificationKind,
    pub context: AppointmentContext,
}

impl NotificationPayload {
    pub fn new(recipient: Recipient, kind: NotificationKind, context: AppointmentContext) -> Self {
        Self { recipient, kind, context }
    }
}
