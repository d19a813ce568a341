// app/src/pipelines/webhook.rs

//! The payment webhook reconciliation flow.
//!
//! Deliveries are at-least-once, possibly duplicated and out of order, and
//! may arrive concurrently for the same purchase. The transition write is
//! guarded on the order still being `pending`; a redelivery or a lost race
//! leaves the order untouched but still flows into the mirror step, since a
//! previous delivery may have settled the order and then failed before
//! writing the campaign mirror. A halted flow still acknowledges the event
//! (2xx) — only signature rejections and persistence failures produce a
//! non-success response, and only the latter should make the provider
//! redeliver.

use crate::errors::AppError;
use crate::models::PaymentStatus;
use crate::pipelines::contexts::{ResolvedOrder, WebhookCtx};
use crate::services::events::AppEvent;
use crate::services::provider_events::{self, EventKind, ProviderEvent, ReconcileAction};
use crate::services::signature;
use crate::state::AppState;
use std::sync::Arc;
use stepflow::{Flow, FlowData, FlowRegistry, StepControl};
use tracing::{event, info, warn, Level};
use uuid::Uuid;

pub fn register_webhook_flow(registry: &Arc<FlowRegistry<AppError>>, _app_state: &AppState) {
  let mut flow = Flow::<WebhookCtx, AppError>::new(&[
    ("verify_signature", false, None),
    ("parse_event", false, None),
    ("resolve_order", false, None),
    ("apply_transition", false, None),
    ("mirror_campaign", false, None),
  ]);

  // Step 1: Verify authenticity before touching any state. No configured
  // secret means a deliberately weaker development mode.
  flow.on("verify_signature", |flow_data: FlowData<WebhookCtx>| {
    Box::pin(async move {
      let (secret_opt, header_opt, payload) = {
        let guard = flow_data.read();
        (
          guard.app_state.config.webhook_signing_secret.clone(),
          guard.signature_header.clone(),
          guard.raw_payload.clone(),
        )
      };

      let secret = match secret_opt {
        Some(secret) => secret,
        None => {
          warn!("No webhook signing secret configured; processing event unverified.");
          return Ok(StepControl::Continue);
        }
      };

      match signature::verify(&secret, header_opt.as_deref(), &payload) {
        Ok(()) => Ok(StepControl::Continue),
        Err(sig_err) => {
          warn!(error = %sig_err, "Webhook signature verification failed; rejecting event.");
          Err(AppError::SignatureRejected(sig_err.to_string()))
        }
      }
    })
  });

  // Step 2: Parse and classify the event envelope
  flow.on("parse_event", |flow_data: FlowData<WebhookCtx>| {
    Box::pin(async move {
      let payload = flow_data.read().raw_payload.clone();

      let parsed: ProviderEvent = serde_json::from_slice(&payload)
        .map_err(|e| AppError::Validation(format!("Invalid webhook payload: {}", e)))?;
      let kind = provider_events::classify(&parsed);

      info!(event_id = %parsed.id, event_type = %parsed.event_type, ?kind, "Webhook event parsed.");
      {
        let mut guard = flow_data.write();
        guard.event = Some(parsed);
        guard.kind = Some(kind);
      }

      if kind == EventKind::Unhandled {
        // Inapplicable to the pack-order flow; acknowledge and move on.
        flow_data.write().dropped = true;
        return Ok(StepControl::Halt);
      }
      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  // Step 3: Map the event to a pack order. Metadata id first, then the
  // stored payment-intent reference for checkout-session events. An
  // unresolvable event is logged and dropped, never retried.
  flow.on("resolve_order", |flow_data: FlowData<WebhookCtx>| {
    Box::pin(async move {
      let (event_clone, kind, db_pool_clone) = {
        let guard = flow_data.read();
        (guard.event.clone(), guard.kind, guard.app_state.db_pool.clone())
      };
      let provider_event =
        event_clone.ok_or_else(|| AppError::Internal("Webhook event missing after parse step.".to_string()))?;
      let kind = kind.ok_or_else(|| AppError::Internal("Event kind missing after parse step.".to_string()))?;

      let mut resolved: Option<ResolvedOrder> = None;

      if let Some(order_id_str) = provider_event.pack_order_id() {
        match Uuid::parse_str(order_id_str) {
          Ok(order_id) => {
            resolved = sqlx::query_as::<_, (Uuid, Uuid, PaymentStatus)>(
              "SELECT id, campaign_id, payment_status FROM pack_orders WHERE id = $1",
            )
            .bind(order_id)
            .fetch_optional(&db_pool_clone)
            .await
            .map_err(AppError::Sqlx)?
            .map(|(id, campaign_id, payment_status)| ResolvedOrder {
              id,
              campaign_id,
              payment_status,
            });
          }
          Err(_) => {
            warn!(event_id = %provider_event.id, "Metadata pack_order_id is not a valid UUID.");
          }
        }

        // Checkout-session events carry the payment-intent reference; store
        // it on first sight so later intent-keyed events can resolve.
        if let (Some(order), EventKind::CheckoutCompleted, Some(intent_ref)) =
          (&resolved, kind, provider_event.payment_intent())
        {
          sqlx::query("UPDATE pack_orders SET payment_intent_ref = COALESCE(payment_intent_ref, $2) WHERE id = $1")
            .bind(order.id)
            .bind(intent_ref)
            .execute(&db_pool_clone)
            .await
            .map_err(AppError::Sqlx)?;
        }
      } else if kind == EventKind::CheckoutCompleted {
        if let Some(intent_ref) = provider_event.payment_intent() {
          resolved = sqlx::query_as::<_, (Uuid, Uuid, PaymentStatus)>(
            "SELECT id, campaign_id, payment_status FROM pack_orders WHERE payment_intent_ref = $1",
          )
          .bind(intent_ref)
          .fetch_optional(&db_pool_clone)
          .await
          .map_err(AppError::Sqlx)?
          .map(|(id, campaign_id, payment_status)| ResolvedOrder {
            id,
            campaign_id,
            payment_status,
          });
        }
      }

      match resolved {
        Some(order) => {
          {
            let mut guard = flow_data.write();
            guard.order = Some(order);
          }
          Ok::<_, AppError>(StepControl::Continue)
        }
        None => {
          // Not a transient failure: the transaction is outside the
          // pack-order flow. Acknowledge so the provider does not retry.
          info!(event_id = %provider_event.id, "Webhook event matches no pack order; dropping.");
          flow_data.write().dropped = true;
          Ok(StepControl::Halt)
        }
      }
    })
  });

  // Step 4: Apply the payment state transition, guarded on `pending`. An
  // already-terminal order does not halt here: the mirror step must still
  // run so a delivery that failed between the two writes is repaired on
  // redelivery.
  flow.on("apply_transition", |flow_data: FlowData<WebhookCtx>| {
    Box::pin(async move {
      let (order_opt, kind_opt, db_pool_clone) = {
        let guard = flow_data.read();
        (guard.order, guard.kind, guard.app_state.db_pool.clone())
      };
      let order = order_opt.ok_or_else(|| AppError::Internal("Order missing after resolve step.".to_string()))?;
      let kind = kind_opt.ok_or_else(|| AppError::Internal("Event kind missing after resolve step.".to_string()))?;

      let target = match provider_events::reconcile_action(order.payment_status, kind) {
        ReconcileAction::Settle(target) => target,
        ReconcileAction::Remirror(current) => {
          info!(order_id = %order.id, status = ?current, "Order already settled; re-asserting the campaign mirror.");
          {
            let mut guard = flow_data.write();
            guard.applied_status = Some(current);
          }
          return Ok(StepControl::Continue);
        }
        ReconcileAction::Ignore => {
          info!(order_id = %order.id, "Event carries no settlement for this order; dropping.");
          flow_data.write().dropped = true;
          return Ok(StepControl::Halt);
        }
      };

      // Conditional write: whoever moves the order out of `pending` wins.
      // The loser re-reads the winner's terminal status and carries it into
      // the mirror step, which is idempotent.
      let update_result = match target {
        PaymentStatus::Completed => {
          sqlx::query(
            "UPDATE pack_orders SET payment_status = $2, paid_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND payment_status = $3",
          )
          .bind(order.id)
          .bind(PaymentStatus::Completed)
          .bind(PaymentStatus::Pending)
          .execute(&db_pool_clone)
          .await
        }
        _ => {
          sqlx::query(
            "UPDATE pack_orders SET payment_status = $2, updated_at = NOW() \
             WHERE id = $1 AND payment_status = $3",
          )
          .bind(order.id)
          .bind(target)
          .bind(PaymentStatus::Pending)
          .execute(&db_pool_clone)
          .await
        }
      };

      match update_result {
        Ok(done) if done.rows_affected() == 0 => {
          let settled_status = sqlx::query_scalar::<_, PaymentStatus>(
            "SELECT payment_status FROM pack_orders WHERE id = $1",
          )
          .bind(order.id)
          .fetch_one(&db_pool_clone)
          .await
          .map_err(AppError::Sqlx)?;
          info!(order_id = %order.id, status = ?settled_status, "Order settled concurrently; mirroring the winner's status.");
          {
            let mut guard = flow_data.write();
            guard.applied_status = Some(settled_status);
          }
          Ok(StepControl::Continue)
        }
        Ok(_) => {
          info!(order_id = %order.id, ?target, "Pack order payment status updated.");
          {
            let mut guard = flow_data.write();
            guard.applied_status = Some(target);
            guard.transition_applied = true;
          }
          Ok(StepControl::Continue)
        }
        Err(sqlx_error) => {
          event!(Level::ERROR, error = %sqlx_error, "Database error while updating pack order.");
          Err(AppError::Sqlx(sqlx_error))
        }
      }
    })
  });

  // Step 5: Propagate the settled status to the campaign mirror. A failure
  // here must surface so the provider retries the whole handler; the order
  // write above is idempotent, so the repeat is safe.
  flow.on("mirror_campaign", |flow_data: FlowData<WebhookCtx>| {
    Box::pin(async move {
      let (order_opt, applied_opt, transition_applied, db_pool_clone, bus) = {
        let guard = flow_data.read();
        (
          guard.order,
          guard.applied_status,
          guard.transition_applied,
          guard.app_state.db_pool.clone(),
          guard.app_state.events.clone(),
        )
      };
      let order = order_opt.ok_or_else(|| AppError::Internal("Order missing in mirror step.".to_string()))?;
      let applied =
        applied_opt.ok_or_else(|| AppError::Internal("Applied status missing in mirror step.".to_string()))?;

      let done = sqlx::query("UPDATE campaigns SET pack_payment_status = $2, updated_at = NOW() WHERE id = $1")
        .bind(order.campaign_id)
        .bind(applied)
        .execute(&db_pool_clone)
        .await
        .map_err(AppError::Sqlx)?;

      if done.rows_affected() == 0 {
        // Half-applied state: the order settled but the campaign mirror did
        // not. Surfacing the inconsistency makes the provider redeliver.
        return Err(AppError::Internal(format!(
          "Campaign {} missing while mirroring pack order {} status.",
          order.campaign_id, order.id
        )));
      }

      // Broadcast only for the delivery that actually settled the order;
      // a re-asserted mirror is not a new settlement.
      if transition_applied {
        bus.publish(AppEvent::PaymentSettled {
          pack_order_id: order.id,
          campaign_id: order.campaign_id,
          status: applied,
        });
      }
      info!(campaign_id = %order.campaign_id, ?applied, "Campaign pack payment mirror updated.");
      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  registry.register(flow);
  tracing::info!("Webhook reconciliation flow registered.");
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::AppConfig;
  use crate::services::events::EventBus;
  use actix_web::web::Bytes;
  use sqlx::postgres::PgPool;
  use stepflow::FlowOutcome;

  // The verify/parse/drop paths never touch the pool, so a lazy connection
  // to a nonexistent server is enough to run the flow.
  fn test_state(secret: Option<&str>) -> AppState {
    let config = AppConfig {
      server_host: "127.0.0.1".to_string(),
      server_port: 0,
      database_url: "postgres://localhost:1/unused".to_string(),
      app_base_url: "http://localhost".to_string(),
      webhook_signing_secret: secret.map(String::from),
      payment_page_url: "https://pay.example.com/checkout".to_string(),
      default_country: "Ireland".to_string(),
      session_idle_secs: 1800,
    };
    let flows = Arc::new(FlowRegistry::<AppError>::new());
    let db_pool = PgPool::connect_lazy(&config.database_url).expect("lazy pool");
    AppState {
      db_pool,
      flows,
      config: Arc::new(config),
      events: EventBus::default(),
    }
  }

  fn webhook_ctx(state: &AppState, payload: &'static [u8], signature_header: Option<String>) -> WebhookCtx {
    WebhookCtx {
      app_state: state.clone(),
      raw_payload: Bytes::from_static(payload),
      signature_header,
      event: None,
      kind: None,
      order: None,
      applied_status: None,
      transition_applied: false,
      dropped: false,
    }
  }

  const UNHANDLED_PAYLOAD: &[u8] =
    br#"{"id":"evt_1","type":"customer.created","data":{"object":{"id":"cus_1","payment_intent":null}}}"#;

  #[tokio::test]
  async fn unhandled_event_halts_as_dropped_without_error() {
    let state = test_state(None);
    register_webhook_flow(&state.flows, &state);

    let flow_data = FlowData::new(webhook_ctx(&state, UNHANDLED_PAYLOAD, None));
    let outcome = state.flows.run(flow_data.clone()).await.expect("drop is not an error");

    assert_eq!(outcome, FlowOutcome::Halted);
    let guard = flow_data.read();
    assert!(guard.dropped);
    assert_eq!(guard.kind, Some(EventKind::Unhandled));
    assert!(guard.order.is_none());
  }

  #[tokio::test]
  async fn signed_unhandled_event_verifies_then_still_drops() {
    let state = test_state(Some("whsec_test"));
    register_webhook_flow(&state.flows, &state);

    let header = signature::sign("whsec_test", 1_700_000_000, UNHANDLED_PAYLOAD);
    let flow_data = FlowData::new(webhook_ctx(&state, UNHANDLED_PAYLOAD, Some(header)));
    let outcome = state.flows.run(flow_data.clone()).await.expect("drop is not an error");

    assert_eq!(outcome, FlowOutcome::Halted);
    assert!(flow_data.read().dropped);
  }

  #[tokio::test]
  async fn missing_signature_is_rejected_before_parsing() {
    let state = test_state(Some("whsec_test"));
    register_webhook_flow(&state.flows, &state);

    let flow_data = FlowData::new(webhook_ctx(&state, UNHANDLED_PAYLOAD, None));
    let result = state.flows.run(flow_data.clone()).await;

    assert!(matches!(result, Err(AppError::SignatureRejected(_))));
    // Rejection happens before any event state is touched.
    assert!(flow_data.read().event.is_none());
  }

  #[tokio::test]
  async fn invalid_payload_fails_as_validation_error() {
    let state = test_state(None);
    register_webhook_flow(&state.flows, &state);

    let flow_data = FlowData::new(webhook_ctx(&state, b"not json", None));
    let result = state.flows.run(flow_data).await;

    assert!(matches!(result, Err(AppError::Validation(_))));
  }
}
