pub mod access_window;
pub mod booking;
pub mod lifecycle;
pub mod reminder;
pub mod upcoming;
pub mod virtual_session;

#[cfg(test)]
pub(crate) mod test_support;

pub use access_window::{can_cancel, can_edit, hours_until, in_reminder_window, is_upcoming};
pub use booking::AppointmentService;
pub use lifecycle::AppointmentLifecycleService;
pub use reminder::{ReminderScanReport, ReminderScanner, ReminderScheduler, ReminderSchedulerHandle};
pub use upcoming::{DismissedSet, UpcomingAppointment, UpcomingAppointmentsService};
pub use virtual_session::{can_join, waiting_for_doctor, VirtualSessionService};
