// app/src/web/handlers/webhook_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;
use tracing::{error, info, instrument, warn};

use crate::errors::AppError;
use crate::pipelines::contexts::WebhookCtx;
use crate::state::AppState;
use stepflow::{FlowData, FlowOutcome};

/// Header the payment provider signs its deliveries with.
pub const SIGNATURE_HEADER: &str = "Causeway-Signature";

/// Payment-provider webhook endpoint.
///
/// Response contract: a 2xx acknowledges the event and stops redelivery, so
/// both processed and deliberately dropped events return 200. Signature
/// failures return 401 (no retry is useful) and persistence failures return
/// 5xx so the provider redelivers.
#[instrument(
    name = "handler::payment_webhook",
    skip(app_state, req, body),
    fields(payload_bytes = body.len())
)]
pub async fn payment_webhook_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let signature_header = req
    .headers()
    .get(SIGNATURE_HEADER)
    .and_then(|h_val| h_val.to_str().ok())
    .map(String::from);

  let webhook_ctx = WebhookCtx {
    app_state: app_state.get_ref().clone(),
    raw_payload: body,
    signature_header,
    event: None,
    kind: None,
    order: None,
    applied_status: None,
    transition_applied: false,
    dropped: false,
  };
  let flow_data = FlowData::new(webhook_ctx);

  match app_state.flows.run(flow_data.clone()).await {
    Ok(FlowOutcome::Completed) => {
      let (order, applied) = {
        let guard = flow_data.read();
        (guard.order, guard.applied_status)
      };
      info!(order = ?order.map(|o| o.id), status = ?applied, "Webhook event processed.");
      Ok(HttpResponse::Ok().json(json!({ "status": "processed" })))
    }
    Ok(FlowOutcome::Halted) => {
      // Dropped (unhandled type or unknown order) or an idempotent no-op.
      // Either way the event is acknowledged so the provider stops retrying.
      let dropped = flow_data.read().dropped;
      if dropped {
        info!("Webhook event dropped as inapplicable.");
      } else {
        info!("Webhook event acknowledged as a no-op.");
      }
      Ok(HttpResponse::Ok().json(json!({ "status": if dropped { "ignored" } else { "no_op" } })))
    }
    Err(app_err) => {
      match &app_err {
        AppError::SignatureRejected(_) => {
          warn!("Webhook rejected: {:?}", app_err);
        }
        _ => {
          error!("Webhook flow failed: {:?}", app_err);
        }
      }
      Err(app_err)
    }
  }
}
