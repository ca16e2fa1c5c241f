use std::env;
use std::time::Duration;
use tracing::warn;

const DEFAULT_REMINDER_SCAN_INTERVAL_SECONDS: u64 = 300;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: String,
    pub email_api_url: String,
    pub email_api_key: String,
    pub email_from_address: String,
    pub app_public_url: String,
    pub reminder_scan_interval_seconds: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_service_role_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_ROLE_KEY not set, using empty value");
                    String::new()
                }),
            email_api_url: env::var("EMAIL_API_URL")
                .unwrap_or_else(|_| {
                    warn!("EMAIL_API_URL not set, using empty value");
                    String::new()
                }),
            email_api_key: env::var("EMAIL_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("EMAIL_API_KEY not set, using empty value");
                    String::new()
                }),
            email_from_address: env::var("EMAIL_FROM_ADDRESS")
                .unwrap_or_else(|_| {
                    warn!("EMAIL_FROM_ADDRESS not set, using default");
                    "no-reply@clinic-booking.local".to_string()
                }),
            app_public_url: env::var("APP_PUBLIC_URL")
                .unwrap_or_else(|_| {
                    warn!("APP_PUBLIC_URL not set, using default");
                    "http://localhost:5173".to_string()
                }),
            reminder_scan_interval_seconds: env::var("REMINDER_SCAN_INTERVAL_SECONDS")
                .ok()
                .and_then(|raw| match raw.parse::<u64>() {
                    Ok(0) | Err(_) => {
                        warn!("REMINDER_SCAN_INTERVAL_SECONDS={} is not a positive integer, using default", raw);
                        None
                    }
                    Ok(seconds) => Some(seconds),
                })
                .unwrap_or(DEFAULT_REMINDER_SCAN_INTERVAL_SECONDS),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
    }

    pub fn is_email_configured(&self) -> bool {
        !self.email_api_url.is_empty()
            && !self.email_api_key.is_empty()
    }

    /// Key sent as the bearer token for background jobs. Falls back to the
    /// anon key when no service role key is present.
    pub fn store_api_key(&self) -> &str {
        if self.supabase_service_role_key.is_empty() {
            &self.supabase_anon_key
        } else {
            &self.supabase_service_role_key
        }
    }

    pub fn reminder_scan_interval(&self) -> Duration {
        Duration::from_secs(self.reminder_scan_interval_seconds)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_service_role_key: String::new(),
            email_api_url: String::new(),
            email_api_key: String::new(),
            email_from_address: "no-reply@clinic-booking.local".to_string(),
            app_public_url: "http://localhost:5173".to_string(),
            reminder_scan_interval_seconds: DEFAULT_REMINDER_SCAN_INTERVAL_SECONDS,
        }
    }
}
