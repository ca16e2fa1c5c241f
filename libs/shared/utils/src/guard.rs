//! Authorization guard shared by every cell.
//!
//! An [`Actor`] is resolved once per request from the backend's user record.
//! Operations describe who may perform them with an [`AccessPolicy`] and
//! evaluate it before reading or writing anything.

use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use shared_models::auth::{Role, User};

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct AccessDenied(pub String);

/// The caller of an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
    /// Patient or doctor record linked to the user, when the role has one.
    pub profile_id: Option<Uuid>,
    /// Clinic a clinic admin is scoped to.
    pub clinic_id: Option<Uuid>,
}

impl Actor {
    pub fn from_user(user: &User, profile_id: Option<Uuid>) -> Result<Self, AccessDenied> {
        let role = user
            .role()
            .ok_or_else(|| AccessDenied(format!("user {} has no recognised role", user.id)))?;

        Ok(Self {
            user_id: user.id,
            role,
            profile_id,
            clinic_id: user.clinic_id,
        })
    }

    pub fn patient(user_id: Uuid, patient_id: Uuid) -> Self {
        Self { user_id, role: Role::Patient, profile_id: Some(patient_id), clinic_id: None }
    }

    pub fn doctor(user_id: Uuid, doctor_id: Uuid) -> Self {
        Self { user_id, role: Role::Doctor, profile_id: Some(doctor_id), clinic_id: None }
    }

    pub fn clinic_admin(user_id: Uuid, clinic_id: Uuid) -> Self {
        Self { user_id, role: Role::ClinicAdmin, profile_id: None, clinic_id: Some(clinic_id) }
    }

    pub fn admin(user_id: Uuid) -> Self {
        Self { user_id, role: Role::Admin, profile_id: None, clinic_id: None }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    fn owns(&self, ownership: &Ownership) -> bool {
        match (self.role, ownership) {
            (Role::Patient, Ownership::Patient(id)) | (Role::Doctor, Ownership::Doctor(id)) => {
                self.profile_id == Some(*id)
            }
            (Role::ClinicAdmin, Ownership::Clinic(id)) => self.clinic_id == Some(*id),
            _ => false,
        }
    }
}

/// Who a resource belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Patient(Uuid),
    Doctor(Uuid),
    Clinic(Uuid),
}

/// Role and ownership requirements of one operation.
///
/// The actor's role must be listed. Unless the actor is an admin, it must also
/// own at least one of the registered resources (when any are registered).
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    action: &'static str,
    roles: Vec<Role>,
    owners: Vec<Ownership>,
}

impl AccessPolicy {
    pub fn new(action: &'static str, roles: &[Role]) -> Self {
        Self {
            action,
            roles: roles.to_vec(),
            owners: Vec::new(),
        }
    }

    pub fn owned_by(mut self, ownership: Ownership) -> Self {
        self.owners.push(ownership);
        self
    }

    pub fn check(&self, actor: &Actor) -> Result<(), AccessDenied> {
        if !self.roles.contains(&actor.role) {
            warn!(user_id = %actor.user_id, role = %actor.role, action = self.action, "role not permitted");
            return Err(AccessDenied(format!(
                "role {} may not {}",
                actor.role, self.action
            )));
        }

        if actor.is_admin() || self.owners.is_empty() {
            return Ok(());
        }

        if self.owners.iter().any(|owner| actor.owns(owner)) {
            Ok(())
        } else {
            warn!(user_id = %actor.user_id, role = %actor.role, action = self.action, "resource not owned by actor");
            Err(AccessDenied(format!(
                "{} {} does not own this resource and may not {}",
                actor.role, actor.user_id, self.action
            )))
        }
    }
}
