use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{Appointment, AppointmentStatus, AppointmentType};

pub(crate) fn appointment(status: AppointmentStatus) -> Appointment {
    appointment_at(status, 2025, 6, 10, "09:00")
}

pub(crate) fn appointment_at(status: AppointmentStatus, year: i32, month: u32, day: u32, time: &str) -> Appointment {
    Appointment {
        id: Uuid::new_v4(),
        patient_id: Uuid::new_v4(),
        doctor_id: Uuid::new_v4(),
        clinic_id: Uuid::new_v4(),
        patient_name: "Lerato Khumalo".to_string(),
        doctor_name: "Mahlangu".to_string(),
        clinic_name: Some("Alexandra Health Centre".to_string()),
        appointment_date: NaiveDate::from_ymd_opt(year, month, day).unwrap(),
        appointment_time: time.to_string(),
        appointment_type: AppointmentType::InPerson,
        status,
        reason: None,
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
