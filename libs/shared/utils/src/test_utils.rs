use chrono::{NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;

use crate::guard::Actor;

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub email_api_url: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            email_api_url: "http://localhost:54322/send".to_string(),
        }
    }
}

impl TestConfig {
    /// Config pointing both the store and the email API at one mock server.
    pub fn with_mock_url(base_url: &str) -> Self {
        Self {
            supabase_url: base_url.to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            email_api_url: format!("{}/email/send", base_url),
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_service_role_key: "test-service-role-key".to_string(),
            email_api_url: self.email_api_url.clone(),
            email_api_key: "test-email-key".to_string(),
            email_from_address: "bookings@test.clinic".to_string(),
            app_public_url: "https://app.test.clinic".to_string(),
            reminder_scan_interval_seconds: 300,
        }
    }
}

pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub clinic_id: Option<Uuid>,
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.to_string(),
            role: role.to_string(),
            clinic_id: None,
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, "doctor")
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "patient")
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id,
            email: Some(self.email.clone()),
            full_name: None,
            role: Some(self.role.clone()),
            clinic_id: self.clinic_id,
            metadata: None,
            created_at: Some(Utc::now()),
        }
    }

    /// Actor for this user; panics on an unknown role since fixtures are static.
    pub fn to_actor(&self, profile_id: Option<Uuid>) -> Actor {
        Actor::from_user(&self.to_user(), profile_id).expect("test user has a valid role")
    }
}

/// Local wall-clock instant, for readable test fixtures.
pub fn local(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .expect("valid fixture date")
}
