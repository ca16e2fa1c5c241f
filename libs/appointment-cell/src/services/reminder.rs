// libs/appointment-cell/src/services/reminder.rs
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument, warn};

use notification_cell::{NotificationDispatcher, NotificationKind, NotificationPayload, Recipient};
use shared_utils::clock::Clock;

use crate::models::{Appointment, AppointmentError, AppointmentStatus};
use crate::services::access_window::in_reminder_window;
use crate::store::AppointmentStore;

/// Outcome of one pass over the confirmed appointments.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReminderScanReport {
    pub scanned: usize,
    pub due: usize,
    pub sent: usize,
    pub already_sent: usize,
    pub failed: usize,
}

/// Finds confirmed appointments 23 to 25 hours out and reminds both parties
/// once. The `reminder_sent` flag is claimed with a conditional write before
/// any email goes out, so overlapping scans cannot double-send.
pub struct ReminderScanner {
    store: Arc<dyn AppointmentStore>,
    notifier: Arc<NotificationDispatcher>,
    clock: Arc<dyn Clock>,
}

impl ReminderScanner {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        notifier: Arc<NotificationDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { store, notifier, clock }
    }

    #[instrument(skip(self))]
    pub async fn scan_once(&self) -> Result<ReminderScanReport, AppointmentError> {
        let now = self.clock.now();
        let confirmed = self.store.list_by_status(AppointmentStatus::Confirmed).await?;

        let mut report = ReminderScanReport {
            scanned: confirmed.len(),
            ..ReminderScanReport::default()
        };

        for appointment in confirmed.iter().filter(|a| in_reminder_window(a, now)) {
            report.due += 1;
            if appointment.reminder_sent {
                report.already_sent += 1;
                continue;
            }

            match self.remind(appointment).await {
                Ok(true) => report.sent += 1,
                Ok(false) => report.already_sent += 1,
                Err(e) => {
                    report.failed += 1;
                    warn!(appointment_id = %appointment.id, "Reminder not delivered: {}", e);
                }
            }
        }

        debug!(?report, "Reminder scan finished");
        Ok(report)
    }

    /// `Ok(false)` when another scan already claimed this appointment.
    async fn remind(&self, appointment: &Appointment) -> Result<bool, AppointmentError> {
        if !self.store.claim_reminder(appointment.id).await? {
            return Ok(false);
        }

        let context = appointment.notification_context();
        let payloads = [
            NotificationPayload::new(
                Recipient::Patient(appointment.patient_id),
                NotificationKind::PatientReminder,
                context.clone(),
            ),
            NotificationPayload::new(
                Recipient::Doctor(appointment.doctor_id),
                NotificationKind::DoctorReminder,
                context,
            ),
        ];

        let delivered = self.notifier.deliver_all_best_effort(&payloads).await;
        if delivered == 0 {
            // Nobody was reached; give a later scan in the same band a chance.
            self.store.release_reminder(appointment.id).await?;
            return Err(AppointmentError::NotificationDeliveryFailed(
                "no reminder could be delivered".to_string(),
            ));
        }

        info!("Reminders sent for appointment {}", appointment.id);
        Ok(true)
    }
}

/// Runs [`ReminderScanner::scan_once`] on a fixed interval until shut down.
pub struct ReminderScheduler {
    scanner: Arc<ReminderScanner>,
    interval: Duration,
}

/// Handle to a spawned scheduler.
pub struct ReminderSchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ReminderSchedulerHandle {
    /// Stops the loop between scans and waits for it to exit. A scan that is
    /// already running finishes first.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            error!("Reminder scheduler task failed: {}", e);
        }
    }
}

impl ReminderScheduler {
    pub fn new(scanner: Arc<ReminderScanner>, interval: Duration) -> Self {
        Self { scanner, interval }
    }

    pub fn spawn(self) -> ReminderSchedulerHandle {
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(self.run(rx));
        ReminderSchedulerHandle { shutdown: tx, task }
    }

    /// The first scan runs immediately. The loop exits when `shutdown`
    /// becomes `true` or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("Reminder scheduler started (every {:?})", self.interval);

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.scanner.scan_once().await {
                        error!("Reminder scan failed: {}", e);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Reminder scheduler stopped");
    }
}
