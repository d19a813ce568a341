// app/src/pipelines/mod.rs

//! Defines and registers all stepflow flows used by the application.

use crate::errors::AppError;
use crate::state::AppState;
use std::sync::Arc;
use stepflow::FlowRegistry;

pub mod contexts;

pub mod signin;
pub mod signup;
pub mod submission;
pub mod webhook;

/// Registers every flow with the provided registry. Called once at startup.
pub fn register_all_flows(registry: &Arc<FlowRegistry<AppError>>, app_state: &AppState) {
  tracing::info!("Registering application flows...");

  signup::register_signup_flow(registry, app_state);
  signin::register_signin_flow(registry, app_state);
  submission::register_submission_flow(registry, app_state);
  webhook::register_webhook_flow(registry, app_state);

  tracing::info!("All application flows registered.");
}
