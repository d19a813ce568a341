// app/src/pipelines/signin.rs

use crate::errors::AppError;
use crate::models::user::User;
use crate::pipelines::contexts::SigninCtx;
use crate::services::auth;
use crate::state::AppState;
use std::sync::Arc;
use stepflow::{Flow, FlowData, FlowRegistry, StepControl};
use tracing::{event, info, warn, Level};
use uuid::Uuid;

/// Registers the sign-in flow backing the wizard's Auth step for returning
/// users.
pub fn register_signin_flow(registry: &Arc<FlowRegistry<AppError>>, _app_state: &AppState) {
  let mut signin_flow = Flow::<SigninCtx, AppError>::new(&[
    ("validate_signin_input", false, None),
    ("fetch_user_and_verify", false, None),
    ("issue_session_token", false, None),
  ]);

  signin_flow.on("validate_signin_input", |flow_data: FlowData<SigninCtx>| {
    Box::pin(async move {
      let (email_empty, password_empty) = {
        let guard = flow_data.read();
        (guard.email.trim().is_empty(), guard.password.is_empty())
      };
      if email_empty || password_empty {
        return Err(AppError::Validation("Email and password are required.".to_string()));
      }
      Ok(StepControl::Continue)
    })
  });

  signin_flow.on("fetch_user_and_verify", |flow_data: FlowData<SigninCtx>| {
    Box::pin(async move {
      let (email_val, password_val, db_pool_clone) = {
        let guard = flow_data.read();
        (guard.email.clone(), guard.password.clone(), guard.app_state.db_pool.clone())
      };

      let user = match sqlx::query_as::<_, User>(
        "SELECT id, email, password_hash, full_name, county, eircode, created_at, updated_at \
         FROM users WHERE email = $1",
      )
      .bind(&email_val)
      .fetch_optional(&db_pool_clone)
      .await
      {
        Ok(Some(user)) => user,
        Ok(None) => {
          warn!("Sign-in attempt for unknown email.");
          // Same message as a bad password so the response does not leak
          // which emails hold accounts.
          return Err(AppError::Auth("Invalid email or password.".to_string()));
        }
        Err(sqlx_error) => {
          event!(Level::ERROR, error = %sqlx_error, "Database error while fetching user for sign-in.");
          return Err(AppError::Sqlx(sqlx_error));
        }
      };

      if !auth::verify_password(&user.password_hash, &password_val)? {
        warn!("Sign-in attempt with wrong password for user {}.", user.id);
        return Err(AppError::Auth("Invalid email or password.".to_string()));
      }

      {
        let mut guard = flow_data.write();
        guard.user_id = Some(user.id);
      }
      Ok(StepControl::Continue)
    })
  });

  signin_flow.on("issue_session_token", |flow_data: FlowData<SigninCtx>| {
    Box::pin(async move {
      let user_id = {
        let guard = flow_data.read();
        guard.user_id
      };
      let user_id = user_id.ok_or_else(|| AppError::Internal("Sign-in verified without a user id.".to_string()))?;

      // Opaque bearer token; session storage and validation middleware are
      // outside this flow's concern.
      let token = format!("cw_{}_{}", user_id.simple(), Uuid::new_v4().simple());
      {
        let mut guard = flow_data.write();
        guard.session_token = Some(token);
      }
      info!("Session token issued for user {}.", user_id);
      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  registry.register(signin_flow);
  tracing::info!("Sign-in flow registered.");
}
