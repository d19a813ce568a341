// app/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub app_base_url: String,

  /// Shared secret for verifying payment-provider webhook signatures.
  /// When absent, events are parsed unverified (development mode only).
  pub webhook_signing_secret: Option<String>,

  /// Base URL of the external payment page a creator is redirected to after
  /// submission. The pack order id is appended as a query parameter.
  pub payment_page_url: String,

  /// Default shipping country for pack orders.
  pub default_country: String,

  /// Idle period (seconds) before a session is signed out for inactivity.
  pub session_idle_secs: u64,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = get_env("DATABASE_URL")?;
    let app_base_url = get_env("APP_BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", server_host, server_port));

    let webhook_signing_secret = env::var("WEBHOOK_SIGNING_SECRET").ok().filter(|s| !s.is_empty());
    if webhook_signing_secret.is_none() {
      tracing::warn!("WEBHOOK_SIGNING_SECRET not set; webhook events will be processed unverified.");
    }

    let payment_page_url = get_env("PAYMENT_PAGE_URL").unwrap_or_else(|_| "https://pay.example.com/checkout".to_string());
    let default_country = get_env("DEFAULT_COUNTRY").unwrap_or_else(|_| "Ireland".to_string());

    let session_idle_secs = get_env("SESSION_IDLE_SECS")
      .unwrap_or_else(|_| "1800".to_string())
      .parse::<u64>()
      .map_err(|e| AppError::Config(format!("Invalid SESSION_IDLE_SECS: {}", e)))?;

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      app_base_url,
      webhook_signing_secret,
      payment_page_url,
      default_country,
      session_idle_secs,
    })
  }
}
