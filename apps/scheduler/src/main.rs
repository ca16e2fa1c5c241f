use std::sync::Arc;

use anyhow::{bail, Context, Result};
use dotenv::dotenv;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use appointment_cell::{ReminderScanner, ReminderScheduler, SupabaseAppointmentStore};
use notification_cell::{EmailSender, HttpEmailSender, NotificationDispatcher, SupabaseContactDirectory};
use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_utils::clock::SystemClock;

#[tokio::main]
async fn main() -> Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting clinic reminder scheduler");

    let config = AppConfig::from_env();
    if !config.is_configured() {
        bail!("SUPABASE_URL and SUPABASE_ANON_PUBLIC_KEY must be set");
    }

    let supabase = Arc::new(SupabaseClient::new(&config));

    if !config.is_email_configured() {
        // Every send fails as not configured, so reminder claims are released
        // and retried by later scans once the email API is set up.
        warn!("Email API not configured; reminders stay pending until it is");
    }
    let sender: Arc<dyn EmailSender> = Arc::new(HttpEmailSender::new(&config));

    let dispatcher = Arc::new(NotificationDispatcher::new(
        sender,
        Arc::new(SupabaseContactDirectory::new(supabase.clone())),
        config.app_public_url.clone(),
    ));

    let scanner = Arc::new(ReminderScanner::new(
        Arc::new(SupabaseAppointmentStore::new(supabase)),
        dispatcher,
        Arc::new(SystemClock),
    ));

    let handle = ReminderScheduler::new(scanner, config.reminder_scan_interval()).spawn();

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    info!("Shutdown requested");
    handle.shutdown().await;
    Ok(())
}
