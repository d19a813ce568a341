// app/src/web/handlers/auth_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::models::County;
use crate::pipelines::contexts::{SigninCtx, SignupCtx};
use crate::state::AppState;
use stepflow::{FlowData, FlowOutcome};

// --- Request DTOs ---

#[derive(Deserialize, Debug)]
pub struct SignupRequestPayload {
  pub email: String,
  pub password: String,
  pub full_name: String,
  pub county: County,
  #[serde(default)]
  pub eircode: String,
}

#[derive(Deserialize, Debug)]
pub struct SigninRequestPayload {
  pub email: String,
  pub password: String,
}

// --- Handler implementations ---

#[instrument(
    name = "handler::signup",
    skip(app_state, req_payload),
    fields(req_email = %req_payload.email)
)]
pub async fn signup_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<SignupRequestPayload>,
) -> Result<HttpResponse, AppError> {
  info!("Signup attempt for email: {}", req_payload.email);

  let payload = req_payload.into_inner();
  let signup_ctx = SignupCtx {
    app_state: app_state.get_ref().clone(),
    email: payload.email.clone(),
    password: payload.password,
    full_name: payload.full_name,
    county: payload.county,
    eircode: payload.eircode.trim().to_uppercase(),
    created_user_id: None,
  };
  let flow_data = FlowData::new(signup_ctx);

  match app_state.flows.run(flow_data.clone()).await {
    Ok(FlowOutcome::Completed) => {
      let user_id = flow_data.read().created_user_id.ok_or_else(|| {
        warn!("Signup flow completed but no user id was set in context.");
        AppError::Internal("Signup completed without creating a user id.".to_string())
      })?;

      info!("Signup successful for email: {}. User ID: {}", payload.email, user_id);
      Ok(HttpResponse::Created().json(json!({
          "message": "Account created successfully.",
          "userId": user_id.to_string(),
          "email": payload.email,
      })))
    }
    Ok(FlowOutcome::Halted) => {
      // Signup has no halting step; a halt here is a flow wiring bug.
      warn!("Signup flow for email {} halted unexpectedly.", payload.email);
      Err(AppError::Internal("Signup process was halted by an internal step.".to_string()))
    }
    Err(app_err) => {
      warn!("Signup flow failed for email {}: {:?}", payload.email, app_err);
      Err(app_err)
    }
  }
}

#[instrument(
    name = "handler::signin",
    skip(app_state, req_payload),
    fields(req_email = %req_payload.email)
)]
pub async fn signin_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<SigninRequestPayload>,
) -> Result<HttpResponse, AppError> {
  info!("Signin attempt for email: {}", req_payload.email);

  let payload = req_payload.into_inner();
  let signin_ctx = SigninCtx {
    app_state: app_state.get_ref().clone(),
    email: payload.email.clone(),
    password: payload.password,
    user_id: None,
    session_token: None,
  };
  let flow_data = FlowData::new(signin_ctx);

  match app_state.flows.run(flow_data.clone()).await {
    Ok(FlowOutcome::Completed) => {
      let (user_id, token) = {
        let guard = flow_data.read();
        (guard.user_id, guard.session_token.clone())
      };
      let user_id = user_id.ok_or_else(|| {
        warn!("Signin flow completed but no user id was set.");
        AppError::Auth("Signin completed without user identification.".to_string())
      })?;
      let token = token.ok_or_else(|| {
        warn!("Signin flow completed but no session token was issued.");
        AppError::Auth("Signin completed without a session token.".to_string())
      })?;

      info!("Signin successful for email: {}. User ID: {}", payload.email, user_id);
      Ok(HttpResponse::Ok().json(json!({
          "message": "Signin successful.",
          "userId": user_id.to_string(),
          "email": payload.email,
          "token": token,
      })))
    }
    Ok(FlowOutcome::Halted) => {
      warn!("Signin flow for email {} halted unexpectedly.", payload.email);
      Err(AppError::Auth("Authentication process was unexpectedly halted.".to_string()))
    }
    Err(app_err) => {
      warn!("Signin flow failed for email {}: {:?}", payload.email, app_err);
      Err(app_err)
    }
  }
}
