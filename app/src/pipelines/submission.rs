// app/src/pipelines/submission.rs

//! The campaign/order submission flow, fired by the wizard's
//! "Create Campaign & Continue" transition.
//!
//! Creates the campaign (unapproved, hidden from public listings) and its
//! pack order (`pending`) and links the two. Validation halts before any
//! write; a database failure surfaces to the wizard, which keeps the draft
//! for an idempotent retry.

use crate::errors::AppError;
use crate::models::PaymentStatus;
use crate::pipelines::contexts::SubmissionCtx;
use crate::state::AppState;
use std::sync::Arc;
use stepflow::{Flow, FlowData, FlowRegistry, StepControl};
use tracing::{event, info, Level};
use uuid::Uuid;

pub fn register_submission_flow(registry: &Arc<FlowRegistry<AppError>>, _app_state: &AppState) {
  let mut flow = Flow::<SubmissionCtx, AppError>::new(&[
    ("validate_submission", false, None),
    ("insert_campaign", false, None),
    ("insert_pack_order", false, None),
    ("link_pack_order", false, None),
  ]);

  // Step 1: Full-draft validation. The wizard gates per step, but the
  // submission re-checks everything server-side in one place.
  flow.on("validate_submission", |flow_data: FlowData<SubmissionCtx>| {
    Box::pin(async move {
      let guard = flow_data.read();

      if !guard.draft.basic_info_complete() {
        return Err(AppError::Validation(
          "Title, organizer, email and story are all required.".to_string(),
        ));
      }
      if guard.draft.county.is_none() {
        return Err(AppError::Validation("A county must be selected.".to_string()));
      }
      if !guard.draft.event_details_complete() {
        return Err(AppError::Validation(
          "The event needs a future date and a location.".to_string(),
        ));
      }
      if guard.draft.parsed_goal().is_none() {
        return Err(AppError::Validation(
          "Goal amount must be between 100 and 50000.".to_string(),
        ));
      }
      if !guard.pack.sizes_complete() {
        return Err(AppError::Validation(
          "The selected pack needs a size for each garment.".to_string(),
        ));
      }
      // Every tier incurs postage, so shipping is required in full even for
      // the free pack.
      if !guard.shipping.is_complete() {
        return Err(AppError::Validation("A complete shipping address is required.".to_string()));
      }
      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  // Step 2: Create the campaign record
  flow.on("insert_campaign", |flow_data: FlowData<SubmissionCtx>| {
    Box::pin(async move {
      let (acting_user_id, draft, db_pool_clone) = {
        let guard = flow_data.read();
        (guard.acting_user_id, guard.draft.clone(), guard.app_state.db_pool.clone())
      };

      let county = draft
        .county
        .ok_or_else(|| AppError::Internal("County missing after validation.".to_string()))?;
      let event_at = draft
        .event_at
        .ok_or_else(|| AppError::Internal("Event date missing after validation.".to_string()))?;
      let goal = draft
        .parsed_goal()
        .ok_or_else(|| AppError::Internal("Goal missing after validation.".to_string()))? as i32;

      match sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO campaigns \
           (user_id, title, organizer_name, organizer_email, story, county, eircode, event_at, location, \
            goal_amount, facebook_url, twitter_url, instagram_url, whatsapp_url, is_active, is_approved) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, TRUE, FALSE) \
         RETURNING id",
      )
      .bind(acting_user_id)
      .bind(&draft.title)
      .bind(&draft.organizer_name)
      .bind(&draft.organizer_email)
      .bind(&draft.story)
      .bind(county)
      .bind(&draft.eircode)
      .bind(event_at)
      .bind(&draft.location)
      .bind(goal)
      .bind(&draft.facebook_url)
      .bind(&draft.twitter_url)
      .bind(&draft.instagram_url)
      .bind(&draft.whatsapp_url)
      .fetch_one(&db_pool_clone)
      .await
      {
        Ok(campaign_id) => {
          {
            let mut guard = flow_data.write();
            guard.campaign_id = Some(campaign_id);
          }
          info!("Campaign {} created for user {}.", campaign_id, acting_user_id);
          Ok(StepControl::Continue)
        }
        Err(sqlx_error) => {
          event!(Level::ERROR, error = %sqlx_error, "Database error while creating campaign.");
          Err(AppError::Sqlx(sqlx_error))
        }
      }
    })
  });

  // Step 3: Create the pack order in `pending`
  flow.on("insert_pack_order", |flow_data: FlowData<SubmissionCtx>| {
    Box::pin(async move {
      let (campaign_id, pack, shipping, db_pool_clone) = {
        let guard = flow_data.read();
        (
          guard.campaign_id,
          guard.pack.clone(),
          guard.shipping.clone(),
          guard.app_state.db_pool.clone(),
        )
      };
      let campaign_id =
        campaign_id.ok_or_else(|| AppError::Internal("Campaign id missing before order creation.".to_string()))?;
      let ship_county = shipping
        .county
        .ok_or_else(|| AppError::Internal("Shipping county missing after validation.".to_string()))?;

      let sizes: Vec<String> = pack.sizes.iter().map(|s| s.as_str().to_string()).collect();

      match sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO pack_orders \
           (campaign_id, tier, sizes, ship_name, ship_line1, ship_line2, ship_city, ship_county, \
            ship_eircode, ship_country, amount_cents, payment_status) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
         RETURNING id",
      )
      .bind(campaign_id)
      .bind(pack.tier)
      .bind(&sizes)
      .bind(&shipping.name)
      .bind(&shipping.line1)
      .bind(&shipping.line2)
      .bind(&shipping.city)
      .bind(ship_county)
      .bind(&shipping.eircode)
      .bind(&shipping.country)
      .bind(pack.amount_cents())
      .bind(PaymentStatus::Pending)
      .fetch_one(&db_pool_clone)
      .await
      {
        Ok(order_id) => {
          {
            let mut guard = flow_data.write();
            guard.pack_order_id = Some(order_id);
          }
          info!("Pack order {} created for campaign {}.", order_id, campaign_id);
          Ok(StepControl::Continue)
        }
        Err(sqlx_error) => {
          event!(Level::ERROR, error = %sqlx_error, "Database error while creating pack order.");
          Err(AppError::Sqlx(sqlx_error))
        }
      }
    })
  });

  // Step 4: Link the order onto the campaign and seed the status mirror
  flow.on("link_pack_order", |flow_data: FlowData<SubmissionCtx>| {
    Box::pin(async move {
      let (campaign_id, pack_order_id, db_pool_clone) = {
        let guard = flow_data.read();
        (guard.campaign_id, guard.pack_order_id, guard.app_state.db_pool.clone())
      };
      let campaign_id =
        campaign_id.ok_or_else(|| AppError::Internal("Campaign id missing before linking.".to_string()))?;
      let pack_order_id =
        pack_order_id.ok_or_else(|| AppError::Internal("Pack order id missing before linking.".to_string()))?;

      sqlx::query("UPDATE campaigns SET pack_order_id = $2, pack_payment_status = $3, updated_at = NOW() WHERE id = $1")
        .bind(campaign_id)
        .bind(pack_order_id)
        .bind(PaymentStatus::Pending)
        .execute(&db_pool_clone)
        .await
        .map_err(AppError::Sqlx)?;

      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  registry.register(flow);
  tracing::info!("Campaign submission flow registered.");
}
