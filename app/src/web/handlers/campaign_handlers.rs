// app/src/web/handlers/campaign_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Campaign, County, GarmentSize, PackTier};
use crate::pipelines::contexts::SubmissionCtx;
use crate::state::AppState;
use crate::wizard::{CampaignDraft, PackSelection, ShippingAddress};
use stepflow::{FlowData, FlowOutcome};

// --- Request DTOs ---

#[derive(Deserialize, Debug)]
pub struct ShippingPayload {
  pub name: String,
  pub line1: String,
  #[serde(default)]
  pub line2: Option<String>,
  pub city: String,
  pub county: County,
  pub eircode: String,
  #[serde(default)]
  pub country: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CreateCampaignPayload {
  pub user_id: Uuid,
  pub title: String,
  pub organizer_name: String,
  pub organizer_email: String,
  pub story: String,
  pub county: County,
  #[serde(default)]
  pub eircode: String,
  pub event_at: DateTime<Utc>,
  pub location: String,
  /// Whole-euro goal, as typed in the wizard.
  pub goal_amount: String,
  #[serde(default)]
  pub facebook_url: Option<String>,
  #[serde(default)]
  pub twitter_url: Option<String>,
  #[serde(default)]
  pub instagram_url: Option<String>,
  #[serde(default)]
  pub whatsapp_url: Option<String>,
  pub pack_tier: PackTier,
  #[serde(default)]
  pub garment_sizes: Vec<GarmentSize>,
  pub shipping: ShippingPayload,
}

// --- Handler implementations ---

/// The wizard's final submission. Creates the unapproved campaign and its
/// pending pack order, then hands back the payment-page redirect.
#[instrument(
    name = "handler::create_campaign",
    skip(app_state, req_payload),
    fields(req_user_id = %req_payload.user_id, req_title = %req_payload.title)
)]
pub async fn create_campaign_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<CreateCampaignPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  info!("Campaign submission received for user {}.", payload.user_id);

  let mut draft = CampaignDraft {
    title: payload.title,
    organizer_name: payload.organizer_name,
    organizer_email: payload.organizer_email,
    story: payload.story,
    county: Some(payload.county),
    eircode: String::new(),
    event_at: Some(payload.event_at),
    location: payload.location,
    goal_amount: payload.goal_amount,
    facebook_url: payload.facebook_url,
    twitter_url: payload.twitter_url,
    instagram_url: payload.instagram_url,
    whatsapp_url: payload.whatsapp_url,
  };
  draft.set_eircode(&payload.eircode);

  let pack = PackSelection {
    tier: payload.pack_tier,
    sizes: payload.garment_sizes,
  };

  let mut shipping = ShippingAddress::with_default_country(
    payload
      .shipping
      .country
      .as_deref()
      .unwrap_or(&app_state.config.default_country),
  );
  shipping.name = payload.shipping.name;
  shipping.line1 = payload.shipping.line1;
  shipping.line2 = payload.shipping.line2;
  shipping.city = payload.shipping.city;
  shipping.county = Some(payload.shipping.county);
  shipping.set_eircode(&payload.shipping.eircode);

  let submission_ctx = SubmissionCtx {
    app_state: app_state.get_ref().clone(),
    acting_user_id: payload.user_id,
    draft,
    pack,
    shipping,
    campaign_id: None,
    pack_order_id: None,
  };
  let flow_data = FlowData::new(submission_ctx);

  match app_state.flows.run(flow_data.clone()).await {
    Ok(FlowOutcome::Completed) => {
      let (campaign_id, pack_order_id) = {
        let guard = flow_data.read();
        (guard.campaign_id, guard.pack_order_id)
      };
      let campaign_id = campaign_id.ok_or_else(|| {
        warn!("Submission flow completed but no campaign id was set.");
        AppError::Internal("Submission completed without a campaign id.".to_string())
      })?;
      let pack_order_id = pack_order_id.ok_or_else(|| {
        warn!("Submission flow completed but no pack order id was set.");
        AppError::Internal("Submission completed without a pack order id.".to_string())
      })?;

      let payment_page_url = format!("{}?order={}", app_state.config.payment_page_url, pack_order_id);
      info!(
        "Campaign {} and pack order {} created; redirecting to payment page.",
        campaign_id, pack_order_id
      );
      Ok(HttpResponse::Created().json(json!({
          "message": "Campaign created. Complete payment to finish.",
          "campaignId": campaign_id.to_string(),
          "packOrderId": pack_order_id.to_string(),
          "paymentPageUrl": payment_page_url,
      })))
    }
    Ok(FlowOutcome::Halted) => {
      warn!("Submission flow halted unexpectedly for user {}.", payload.user_id);
      Err(AppError::Internal("Campaign submission was halted by an internal step.".to_string()))
    }
    Err(app_err) => {
      warn!("Submission flow failed for user {}: {:?}", payload.user_id, app_err);
      Err(app_err)
    }
  }
}

#[instrument(name = "handler::get_campaign", skip(app_state))]
pub async fn get_campaign_handler(
  app_state: web::Data<AppState>,
  campaign_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let campaign_id = campaign_id.into_inner();

  let campaign = sqlx::query_as::<_, Campaign>(
    "SELECT id, user_id, title, organizer_name, organizer_email, story, county, eircode, event_at, \
            location, goal_amount, facebook_url, twitter_url, instagram_url, whatsapp_url, \
            is_active, is_approved, raised_amount_cents, pack_order_id, pack_payment_status, \
            created_at, updated_at \
     FROM campaigns WHERE id = $1",
  )
  .bind(campaign_id)
  .fetch_optional(&app_state.db_pool)
  .await
  .map_err(AppError::Sqlx)?
  .ok_or_else(|| AppError::NotFound(format!("Campaign {} not found.", campaign_id)))?;

  Ok(HttpResponse::Ok().json(campaign))
}
