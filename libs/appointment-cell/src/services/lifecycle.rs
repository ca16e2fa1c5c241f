// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use shared_models::auth::Role;
use shared_utils::guard::{AccessPolicy, Actor, Ownership};

use crate::models::{Appointment, AppointmentError, AppointmentStatus};

/// Appointment status state machine and the role rules attached to each edge.
///
/// ```text
/// pending ──> confirmed ──> in_progress ──> completed
///    │            │   └────────────────────────^
///    └──> cancelled <──┘
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Get all valid next statuses for a given current status
    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> &'static [AppointmentStatus] {
        match current_status {
            AppointmentStatus::Pending => &[AppointmentStatus::Confirmed, AppointmentStatus::Cancelled],
            AppointmentStatus::Confirmed => &[
                AppointmentStatus::InProgress,
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::InProgress => &[AppointmentStatus::Completed],
            // Terminal states - no transitions allowed
            AppointmentStatus::Completed | AppointmentStatus::Cancelled => &[],
        }
    }

    /// Validate that a status transition is an edge of the graph
    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        if !self.get_valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidTransition {
                from: current_status,
                to: new_status,
            });
        }
        Ok(())
    }

    /// Roles that may ever request `target`, regardless of the current status.
    fn roles_for_target(&self, target: AppointmentStatus) -> &'static [Role] {
        match target {
            AppointmentStatus::Cancelled => &[Role::Patient, Role::Doctor, Role::Admin],
            AppointmentStatus::Confirmed
            | AppointmentStatus::InProgress
            | AppointmentStatus::Completed => &[Role::Doctor, Role::Admin],
            AppointmentStatus::Pending => &[Role::Admin],
        }
    }

    /// Roles allowed on a specific edge. Only meaningful for valid edges.
    fn roles_for_edge(&self, from: AppointmentStatus, to: AppointmentStatus) -> &'static [Role] {
        match (from, to) {
            // Doctor declines, or patient withdraws before review
            (AppointmentStatus::Pending, AppointmentStatus::Cancelled) => {
                &[Role::Patient, Role::Doctor, Role::Admin]
            }
            (AppointmentStatus::Confirmed, AppointmentStatus::Cancelled) => &[Role::Patient, Role::Admin],
            _ => &[Role::Doctor, Role::Admin],
        }
    }

    /// Decide whether `actor` may move `appointment` to `target`.
    ///
    /// A role that can never request the target fails with `Forbidden` before
    /// the edge is looked at; an illegal edge fails with `InvalidTransition`;
    /// a legal edge the actor does not own, or may not take, is `Forbidden`.
    pub fn authorize_transition(
        &self,
        appointment: &Appointment,
        actor: &Actor,
        target: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!(
            appointment_id = %appointment.id,
            role = %actor.role,
            "Authorizing {} -> {}", appointment.status, target
        );

        AccessPolicy::new("request this status", self.roles_for_target(target)).check(actor)?;

        self.validate_status_transition(appointment.status, target)?;

        AccessPolicy::new("take this status transition", self.roles_for_edge(appointment.status, target))
            .owned_by(Ownership::Patient(appointment.patient_id))
            .owned_by(Ownership::Doctor(appointment.doctor_id))
            .check(actor)?;

        Ok(())
    }
}
