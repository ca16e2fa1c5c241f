mod memory;
mod supabase;

pub use memory::{InMemoryClinicStore, RoleGrant};
pub use supabase::SupabaseClinicStore;

use async_trait::async_trait;
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::Clinic;

#[async_trait]
pub trait ClinicStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Clinic>, AppError>;

    async fn create(&self, clinic: Clinic) -> Result<Clinic, AppError>;

    /// Replaces the registration code while `code_used` is still false.
    /// `None` when the clinic is missing or its code was already redeemed.
    async fn set_registration_code(&self, id: Uuid, code: &str) -> Result<Option<Clinic>, AppError>;

    /// Marks the code used and records `admin_user_id`, but only if the
    /// clinic still holds `code` unredeemed. On success the user is also
    /// granted the clinic-admin role for this clinic. `None` means another
    /// redemption or a re-issue got there first.
    async fn redeem_if_unused(
        &self,
        id: Uuid,
        code: &str,
        admin_user_id: Uuid,
    ) -> Result<Option<Clinic>, AppError>;
}
