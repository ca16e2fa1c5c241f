//! Time-window predicates over appointments.
//!
//! Hours are whole hours between `now` and the appointment start, truncated
//! toward zero, so an appointment 23h59m away is 23 hours out.

use chrono::NaiveDateTime;
use tracing::warn;

use crate::models::{Appointment, AppointmentStatus};

pub const EDIT_CUTOFF_HOURS: i64 = 24;
pub const REMINDER_WINDOW_START_HOURS: i64 = 23;
pub const REMINDER_WINDOW_END_HOURS: i64 = 25;
pub const UPCOMING_BANNER_HOURS: i64 = 48;

/// Whole hours from `now` until the appointment starts. Negative once it has
/// started; `None` if the stored time of day cannot be parsed.
pub fn hours_until(appointment: &Appointment, now: NaiveDateTime) -> Option<i64> {
    match appointment.scheduled_at() {
        Ok(start) => Some((start - now).num_hours()),
        Err(e) => {
            warn!(appointment_id = %appointment.id, "Skipping time window check: {}", e);
            None
        }
    }
}

/// Patient may reschedule: still pending and at least 24 hours out.
pub fn can_edit(appointment: &Appointment, now: NaiveDateTime) -> bool {
    appointment.status == AppointmentStatus::Pending
        && hours_until(appointment, now).is_some_and(|h| h >= EDIT_CUTOFF_HOURS)
}

/// Cancellation has no time restriction, only a status one.
pub fn can_cancel(appointment: &Appointment) -> bool {
    matches!(
        appointment.status,
        AppointmentStatus::Pending | AppointmentStatus::Confirmed
    )
}

/// Confirmed and 23 to 25 hours out. Says nothing about whether a reminder
/// was already sent.
pub fn in_reminder_window(appointment: &Appointment, now: NaiveDateTime) -> bool {
    appointment.status == AppointmentStatus::Confirmed
        && hours_until(appointment, now)
            .is_some_and(|h| (REMINDER_WINDOW_START_HOURS..=REMINDER_WINDOW_END_HOURS).contains(&h))
}

/// Confirmed and due within the next 48 hours.
pub fn is_upcoming(appointment: &Appointment, now: NaiveDateTime) -> bool {
    appointment.status == AppointmentStatus::Confirmed
        && hours_until(appointment, now).is_some_and(|h| h > 0 && h <= UPCOMING_BANNER_HOURS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::appointment_at;
    use shared_utils::test_utils::local;

    const ALL: [AppointmentStatus; 5] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::InProgress,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
    ];

    #[test]
    fn edit_window_closes_at_twenty_four_hours() {
        let appt = appointment_at(AppointmentStatus::Pending, 2025, 6, 10, "09:00");

        assert!(can_edit(&appt, local(2025, 6, 9, 8, 0)), "25h out");
        assert!(can_edit(&appt, local(2025, 6, 9, 9, 0)), "exactly 24h out");
        assert!(!can_edit(&appt, local(2025, 6, 9, 9, 1)), "23h59m out");
        assert!(!can_edit(&appt, local(2025, 6, 9, 10, 0)), "23h out");
    }

    #[test]
    fn only_pending_is_editable() {
        let far_past = local(2025, 1, 1, 0, 0);
        for status in ALL {
            let appt = appointment_at(status, 2025, 6, 10, "09:00");
            assert_eq!(can_edit(&appt, far_past), status == AppointmentStatus::Pending);
        }
    }

    #[test]
    fn cancel_depends_on_status_only() {
        for status in ALL {
            let appt = appointment_at(status, 2025, 6, 10, "09:00");
            assert_eq!(
                can_cancel(&appt),
                matches!(status, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
            );
        }
    }

    #[test]
    fn reminder_band_is_inclusive() {
        let appt = appointment_at(AppointmentStatus::Confirmed, 2025, 6, 10, "09:00");

        assert!(!in_reminder_window(&appt, local(2025, 6, 9, 7, 0)), "26h out");
        assert!(in_reminder_window(&appt, local(2025, 6, 9, 8, 0)), "25h out");
        assert!(in_reminder_window(&appt, local(2025, 6, 9, 9, 0)), "24h out");
        assert!(in_reminder_window(&appt, local(2025, 6, 9, 10, 0)), "23h out");
        assert!(!in_reminder_window(&appt, local(2025, 6, 9, 10, 1)), "22h59m out");
    }

    #[test]
    fn reminder_band_requires_confirmed() {
        let appt = appointment_at(AppointmentStatus::Pending, 2025, 6, 10, "09:00");
        assert!(!in_reminder_window(&appt, local(2025, 6, 9, 9, 0)));
    }

    #[test]
    fn banner_covers_next_two_days() {
        let appt = appointment_at(AppointmentStatus::Confirmed, 2025, 6, 10, "09:00");

        assert!(is_upcoming(&appt, local(2025, 6, 8, 9, 0)), "48h out");
        assert!(!is_upcoming(&appt, local(2025, 6, 8, 8, 0)), "49h out");
        assert!(is_upcoming(&appt, local(2025, 6, 10, 8, 0)), "1h out");
        assert!(!is_upcoming(&appt, local(2025, 6, 10, 8, 30)), "30m out truncates to 0");
    }

    #[test]
    fn unparseable_time_closes_every_window() {
        let appt = appointment_at(AppointmentStatus::Pending, 2025, 6, 10, "morning");
        assert!(!can_edit(&appt, local(2025, 1, 1, 0, 0)));
        assert_eq!(hours_until(&appt, local(2025, 1, 1, 0, 0)), None);
    }
}
