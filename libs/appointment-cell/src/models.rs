// libs/appointment-cell/src/models.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use notification_cell::AppointmentContext;
use shared_models::error::AppError;
use shared_utils::guard::AccessDenied;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub clinic_id: Uuid,
    pub patient_name: String,
    pub doctor_name: String,
    pub clinic_name: Option<String>,
    pub appointment_date: NaiveDate,
    /// Clinic-local time of day, `HH:MM`.
    pub appointment_time: String,
    pub appointment_type: AppointmentType,
    pub status: AppointmentStatus,
    pub reason: Option<String>,
    pub meeting_room_id: Option<String>,
    pub meeting_link: Option<String>,
    #[serde(default)]
    pub virtual_session_started: bool,
    #[serde(default)]
    pub virtual_session_ended: bool,
    pub session_start_time: Option<DateTime<Utc>>,
    pub session_end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reminder_sent: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Appointment {
    /// Local wall-clock start of the appointment.
    pub fn scheduled_at(&self) -> Result<NaiveDateTime, AppointmentError> {
        parse_time_of_day(&self.appointment_time).map(|t| self.appointment_date.and_time(t))
    }

    pub fn is_virtual(&self) -> bool {
        self.appointment_type == AppointmentType::Virtual
    }

    /// Session started and not yet ended.
    pub fn session_live(&self) -> bool {
        self.virtual_session_started && !self.virtual_session_ended
    }

    pub fn notification_context(&self) -> AppointmentContext {
        AppointmentContext {
            appointment_id: self.id,
            patient_name: self.patient_name.clone(),
            doctor_name: self.doctor_name.clone(),
            clinic_name: self.clinic_name.clone(),
            date: self.appointment_date,
            time: self.appointment_time.clone(),
            is_virtual: self.is_virtual(),
            reason: self.reason.clone(),
            meeting_link: self.meeting_link.clone(),
        }
    }
}

/// Accepts `HH:MM` and `HH:MM:SS`.
pub fn parse_time_of_day(raw: &str) -> Result<NaiveTime, AppointmentError> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| AppointmentError::InvalidTime(format!("unrecognised time of day: {:?}", raw)))
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::InProgress => write!(f, "in_progress"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "in_progress" => Ok(AppointmentStatus::InProgress),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            other => Err(AppointmentError::ValidationError(format!("unknown status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AppointmentType {
    #[serde(rename = "in-person", alias = "in_person")]
    InPerson,
    #[serde(rename = "virtual")]
    Virtual,
}

impl fmt::Display for AppointmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentType::InPerson => write!(f, "in-person"),
            AppointmentType::Virtual => write!(f, "virtual"),
        }
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: Uuid,
    pub clinic_id: Uuid,
    pub patient_name: String,
    pub doctor_name: String,
    pub clinic_name: Option<String>,
    pub appointment_date: NaiveDate,
    pub appointment_time: String,
    pub appointment_type: AppointmentType,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleRequest {
    pub appointment_date: NaiveDate,
    pub appointment_time: String,
}

/// Partial write applied by the store. Unset fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct AppointmentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_session_started: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_session_ended: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_end_time: Option<DateTime<Utc>>,
}

impl AppointmentUpdate {
    pub fn status(status: AppointmentStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn reschedule(date: NaiveDate, time: String) -> Self {
        Self {
            appointment_date: Some(date),
            appointment_time: Some(time),
            ..Self::default()
        }
    }

    pub fn apply(&self, appointment: &mut Appointment) {
        if let Some(status) = self.status {
            appointment.status = status;
        }
        if let Some(date) = self.appointment_date {
            appointment.appointment_date = date;
        }
        if let Some(time) = &self.appointment_time {
            appointment.appointment_time = time.clone();
        }
        if let Some(started) = self.virtual_session_started {
            appointment.virtual_session_started = started;
        }
        if let Some(ended) = self.virtual_session_ended {
            appointment.virtual_session_ended = ended;
        }
        if self.session_start_time.is_some() {
            appointment.session_start_time = self.session_start_time;
        }
        if self.session_end_time.is_some() {
            appointment.session_end_time = self.session_end_time;
        }
        appointment.updated_at = Some(Utc::now());
    }
}

/// Room details handed to a participant allowed into a virtual session.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MeetingAccess {
    pub appointment_id: Uuid,
    pub meeting_room_id: String,
    pub meeting_link: Option<String>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppointmentError {
    #[error("Appointment not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Appointment can no longer be edited: {0}")]
    EditNotAllowed(String),

    #[error("Appointment {0} is not a virtual appointment")]
    NotVirtual(Uuid),

    #[error("Virtual session is not available: {0}")]
    SessionNotAvailable(String),

    #[error("Notification delivery failed: {0}")]
    NotificationDeliveryFailed(String),

    #[error("Invalid appointment time: {0}")]
    InvalidTime(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Store error: {0}")]
    Store(#[from] AppError),
}

impl From<AccessDenied> for AppointmentError {
    fn from(denied: AccessDenied) -> Self {
        AppointmentError::Forbidden(denied.0)
    }
}
