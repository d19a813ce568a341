// app/src/pipelines/signup.rs

use crate::errors::AppError;
use crate::models::user::User;
use crate::pipelines::contexts::SignupCtx;
use crate::services::auth;
use crate::state::AppState;
use std::sync::Arc;
use stepflow::{Flow, FlowData, FlowRegistry, StepControl};
use tracing::{event, info, warn, Level};

/// Registers the account-creation flow backing the wizard's Auth step.
pub fn register_signup_flow(registry: &Arc<FlowRegistry<AppError>>, _app_state: &AppState) {
  let mut signup_flow = Flow::<SignupCtx, AppError>::new(&[
    ("validate_signup_input", false, None),
    ("check_existing_user", false, None),
    ("create_user_in_db", false, None),
  ]);

  // Step 1: Validate input
  signup_flow.on("validate_signup_input", |flow_data: FlowData<SignupCtx>| {
    Box::pin(async move {
      let (email_val, password_len, full_name_val) = {
        let guard = flow_data.read();
        (guard.email.clone(), guard.password.len(), guard.full_name.clone())
      };

      event!(Level::DEBUG, email = %email_val, "Validating signup input.");
      if email_val.is_empty() || !email_val.contains('@') {
        warn!("Invalid email format provided for signup.");
        return Err(AppError::Validation("Valid email is required.".to_string()));
      }
      if password_len < 8 {
        warn!("Password too short for signup ({} chars).", password_len);
        return Err(AppError::Validation(
          "Password must be at least 8 characters long.".to_string(),
        ));
      }
      if full_name_val.trim().is_empty() {
        return Err(AppError::Validation("Full name is required.".to_string()));
      }
      Ok(StepControl::Continue)
    })
  });

  // Step 2: Check if a user with this email already exists
  signup_flow.on("check_existing_user", |flow_data: FlowData<SignupCtx>| {
    Box::pin(async move {
      let (email_val, db_pool_clone) = {
        let guard = flow_data.read();
        (guard.email.clone(), guard.app_state.db_pool.clone())
      };

      match sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
        .bind(&email_val)
        .fetch_one(&db_pool_clone)
        .await
      {
        Ok(true) => {
          warn!("Attempt to signup with existing email: {}", email_val);
          Err(AppError::Validation("An account with this email already exists.".to_string()))
        }
        Ok(false) => Ok(StepControl::Continue),
        Err(sqlx_error) => {
          event!(Level::ERROR, error = %sqlx_error, "Database error while checking for existing user.");
          Err(AppError::Sqlx(sqlx_error))
        }
      }
    })
  });

  // Step 3: Create the user (includes password hashing)
  signup_flow.on("create_user_in_db", |flow_data: FlowData<SignupCtx>| {
    Box::pin(async move {
      let (email_val, password_val, full_name_val, county_val, eircode_val, db_pool_clone) = {
        let guard = flow_data.read();
        (
          guard.email.clone(),
          guard.password.clone(),
          guard.full_name.clone(),
          guard.county,
          guard.eircode.clone(),
          guard.app_state.db_pool.clone(),
        )
      };

      let hashed_password = auth::hash_password(&password_val)?;

      match sqlx::query_as::<_, User>(
        "INSERT INTO users (email, password_hash, full_name, county, eircode) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, email, password_hash, full_name, county, eircode, created_at, updated_at",
      )
      .bind(&email_val)
      .bind(hashed_password)
      .bind(&full_name_val)
      .bind(county_val)
      .bind(&eircode_val)
      .fetch_one(&db_pool_clone)
      .await
      {
        Ok(new_user) => {
          {
            let mut guard = flow_data.write();
            guard.created_user_id = Some(new_user.id);
          }
          info!("User created successfully: ID={}, Email={}", new_user.id, new_user.email);
          Ok(StepControl::Continue)
        }
        Err(sqlx_error) => {
          event!(Level::ERROR, error = %sqlx_error, "Database error while creating user.");
          Err(AppError::Sqlx(sqlx_error))
        }
      }
    })
  });

  registry.register(signup_flow);
  tracing::info!("Sign-up flow registered.");
}
