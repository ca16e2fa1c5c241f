//! Email templates. Rendering is pure: it turns a payload into subject and
//! body text and never decides whether a message should be sent.

use std::fmt::Write;

use crate::models::{AppointmentContext, NotificationKind};

pub const SYSTEM_NAME: &str = "National Clinic Booking System";

const DIVIDER: &str = "----------------------------------------";

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEmail {
    pub subject: String,
    pub body: String,
}

pub struct TemplateRenderer {
    app_url: String,
}

impl TemplateRenderer {
    pub fn new(app_url: impl Into<String>) -> Self {
        Self {
            app_url: app_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn render(&self, kind: NotificationKind, ctx: &AppointmentContext) -> RenderedEmail {
        match kind {
            NotificationKind::BookingReceived => self.booking_received(ctx),
            NotificationKind::AppointmentConfirmed => self.confirmed(ctx),
            NotificationKind::AppointmentDeclined => self.declined(ctx),
            NotificationKind::AppointmentCancelled => self.cancelled(ctx),
            NotificationKind::PatientReminder => self.patient_reminder(ctx),
            NotificationKind::DoctorReminder => self.doctor_reminder(ctx),
            NotificationKind::VirtualSessionReady => self.session_ready(ctx),
        }
    }

    fn booking_received(&self, ctx: &AppointmentContext) -> RenderedEmail {
        let mut body = format!("Dear {},\n\nYour appointment has been booked successfully!\n\n", ctx.patient_name);
        details(&mut body, ctx);
        if ctx.is_virtual {
            body.push_str(
                "Type: Virtual Consultation\n\
                 Your doctor will start the virtual session at the appointment time. \
                 You will receive another email when they are ready; then click \"Join Meeting\" on your dashboard.\n",
            );
        } else {
            body.push_str("Type: In-Person Visit\n");
        }
        body.push_str("Status: Pending Confirmation\n\n");
        body.push_str("Your doctor will review and confirm your appointment shortly.\n");
        body.push_str("You can edit your appointment up to 24 hours before the scheduled time through your dashboard.\n");
        sign_off(&mut body);

        RenderedEmail {
            subject: format!("Appointment Confirmation - {}", SYSTEM_NAME),
            body,
        }
    }

    fn confirmed(&self, ctx: &AppointmentContext) -> RenderedEmail {
        let mut body = format!(
            "Dear {},\n\nGreat news! Your appointment has been confirmed by Dr. {}.\n\n",
            ctx.patient_name, ctx.doctor_name
        );
        details(&mut body, ctx);
        body.push_str("Status: Confirmed\n\n");
        if !ctx.is_virtual {
            body.push_str("Please arrive 10 minutes early for registration.\n");
        }
        let _ = writeln!(body, "Manage your appointment at {}", self.dashboard_link());
        sign_off(&mut body);

        RenderedEmail {
            subject: format!("Appointment Confirmed - {}", SYSTEM_NAME),
            body,
        }
    }

    fn declined(&self, ctx: &AppointmentContext) -> RenderedEmail {
        let mut body = format!(
            "Dear {},\n\nWe regret to inform you that your appointment with Dr. {} has been declined.\n\n",
            ctx.patient_name, ctx.doctor_name
        );
        details(&mut body, ctx);
        body.push_str("Status: Declined\n\n");
        body.push_str("This may be due to scheduling conflicts or the doctor's availability.\n");
        let _ = writeln!(body, "You can book a new appointment at {}", self.dashboard_link());
        sign_off(&mut body);

        RenderedEmail {
            subject: format!("Appointment Update - {}", SYSTEM_NAME),
            body,
        }
    }

    fn cancelled(&self, ctx: &AppointmentContext) -> RenderedEmail {
        let mut body = format!(
            "Dear {},\n\nYour appointment with Dr. {} has been cancelled as requested.\n\n",
            ctx.patient_name, ctx.doctor_name
        );
        details(&mut body, ctx);
        body.push_str("Status: Cancelled\n\n");
        let _ = writeln!(body, "You can book a new appointment at {}", self.dashboard_link());
        sign_off(&mut body);

        RenderedEmail {
            subject: format!("Appointment Cancelled - {}", SYSTEM_NAME),
            body,
        }
    }

    fn patient_reminder(&self, ctx: &AppointmentContext) -> RenderedEmail {
        let mut body = format!(
            "Dear {},\n\nThis is a friendly reminder about your upcoming appointment.\n\n",
            ctx.patient_name
        );
        details(&mut body, ctx);
        body.push('\n');
        if ctx.is_virtual {
            body.push_str("Your doctor will start the virtual session at the appointment time.\n");
        } else {
            body.push_str("Please arrive 10 minutes early for check-in and bring your ID.\n");
        }
        let _ = writeln!(body, "Need to make changes? Visit {}", self.dashboard_link());
        sign_off(&mut body);

        RenderedEmail {
            subject: format!("Reminder: Appointment Tomorrow - {}", SYSTEM_NAME),
            body,
        }
    }

    fn doctor_reminder(&self, ctx: &AppointmentContext) -> RenderedEmail {
        let mut body = format!(
            "Dear Dr. {},\n\nReminder of your confirmed appointment tomorrow:\n\n",
            ctx.doctor_name
        );
        details(&mut body, ctx);
        let _ = writeln!(body, "Patient: {}", ctx.patient_name);
        if let Some(reason) = ctx.reason.as_deref().filter(|r| !r.trim().is_empty()) {
            let _ = writeln!(body, "\nReason for Visit:\n{}", reason);
        }
        body.push_str("\nThe patient has been notified.\n");
        sign_off(&mut body);

        RenderedEmail {
            subject: "Reminder: Patient Appointment Tomorrow".to_string(),
            body,
        }
    }

    fn session_ready(&self, ctx: &AppointmentContext) -> RenderedEmail {
        let mut body = format!(
            "Dear {},\n\nDr. {} has started your virtual consultation session and is waiting for you!\n\n",
            ctx.patient_name, ctx.doctor_name
        );
        details(&mut body, ctx);
        let _ = writeln!(
            body,
            "\nJoin now: log in at {} and click \"Join Meeting Now\" on your appointment.",
            self.app_url
        );
        if let Some(link) = &ctx.meeting_link {
            let _ = writeln!(body, "Meeting link: {}", link);
        }
        sign_off(&mut body);

        RenderedEmail {
            subject: "Your Doctor is Ready - Join Virtual Consultation Now".to_string(),
            body,
        }
    }

    fn dashboard_link(&self) -> String {
        format!("{}/#/patient-dashboard", self.app_url)
    }
}

fn details(body: &mut String, ctx: &AppointmentContext) {
    body.push_str("Appointment Details:\n");
    body.push_str(DIVIDER);
    body.push('\n');
    let _ = writeln!(body, "Date: {}", ctx.date.format("%A, %B %-d, %Y"));
    let _ = writeln!(body, "Time: {}", ctx.time);
    let _ = writeln!(body, "Doctor: Dr. {}", ctx.doctor_name);
    let _ = writeln!(body, "Clinic: {}", ctx.clinic_name.as_deref().unwrap_or("N/A"));
}

fn sign_off(body: &mut String) {
    let _ = write!(body, "\nBest regards,\n{} Team\n", SYSTEM_NAME);
}
