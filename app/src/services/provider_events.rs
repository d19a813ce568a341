// app/src/services/provider_events.rs

//! Payment-provider event envelope, classification, and the pack-order
//! payment state transition function.
//!
//! Delivery is at-least-once and possibly out of order; the provider may
//! also send both a checkout-session completion and a payment-success event
//! for the same purchase. Everything here is pure so the reconciliation
//! rules stay testable without a database.

use crate::models::PaymentStatus;
use serde::Deserialize;
use std::collections::HashMap;

/// The inbound event envelope, as delivered by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEvent {
  pub id: String,
  #[serde(rename = "type")]
  pub event_type: String,
  pub data: ProviderEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEventData {
  pub object: ProviderEventObject,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEventObject {
  /// Provider-side object id (charge id, session id, ...).
  pub id: Option<String>,
  /// Payment-intent reference carried by checkout-session events.
  pub payment_intent: Option<String>,
  #[serde(default)]
  pub metadata: HashMap<String, String>,
}

impl ProviderEvent {
  /// Order id embedded in the event metadata, when the provider was given
  /// one at checkout creation.
  pub fn pack_order_id(&self) -> Option<&str> {
    self.data.object.metadata.get("pack_order_id").map(String::as_str)
  }

  pub fn payment_intent(&self) -> Option<&str> {
    self.data.object.payment_intent.as_deref()
  }
}

/// What an event means for a pack order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
  /// A successful charge.
  ChargeSucceeded,
  /// A failed charge.
  ChargeFailed,
  /// Checkout session completed; counts as payment success and is the event
  /// that carries the payment-intent reference.
  CheckoutCompleted,
  /// Anything else; inapplicable to the pack-order flow.
  Unhandled,
}

pub fn classify(event: &ProviderEvent) -> EventKind {
  match event.event_type.as_str() {
    "charge.succeeded" | "payment_intent.succeeded" => EventKind::ChargeSucceeded,
    "charge.failed" | "payment_intent.payment_failed" => EventKind::ChargeFailed,
    "checkout.session.completed" => EventKind::CheckoutCompleted,
    _ => EventKind::Unhandled,
  }
}

/// The terminal status an event settles an order into, if any.
pub fn settlement_for(kind: EventKind) -> Option<PaymentStatus> {
  match kind {
    EventKind::ChargeSucceeded | EventKind::CheckoutCompleted => Some(PaymentStatus::Completed),
    EventKind::ChargeFailed => Some(PaymentStatus::Failed),
    EventKind::Unhandled => None,
  }
}

/// The transition to apply for `kind` given the order's current status, or
/// `None` when the event is a no-op.
///
/// Only `pending` orders move. Terminal states are monotonic: redelivered
/// events and late conflicting events (a `failed` after a `completed`, or
/// vice versa) never regress or overwrite a settled order.
pub fn next_status(current: PaymentStatus, kind: EventKind) -> Option<PaymentStatus> {
  if current.is_terminal() {
    return None;
  }
  settlement_for(kind)
}

/// What the reconciler should do for `kind` given the order's current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
  /// Move the pending order to the given terminal status, then mirror it.
  Settle(PaymentStatus),
  /// The order is already terminal. The order row stays untouched, but the
  /// campaign mirror must still be re-asserted: a previous delivery may have
  /// settled the order and then failed before mirroring, and redelivery is
  /// the only repair path for that half-applied state.
  Remirror(PaymentStatus),
  /// The event carries no settlement for this order.
  Ignore,
}

pub fn reconcile_action(current: PaymentStatus, kind: EventKind) -> ReconcileAction {
  if current.is_terminal() {
    return ReconcileAction::Remirror(current);
  }
  match next_status(current, kind) {
    Some(target) => ReconcileAction::Settle(target),
    None => ReconcileAction::Ignore,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn event(event_type: &str) -> ProviderEvent {
    serde_json::from_value(serde_json::json!({
      "id": "evt_123",
      "type": event_type,
      "data": { "object": {
        "id": "cs_456",
        "payment_intent": "pi_789",
        "metadata": { "pack_order_id": "5f7e2c1a-8b4d-4a2e-9c3f-1d2e3f4a5b6c" }
      }}
    }))
    .unwrap()
  }

  #[test]
  fn classification_covers_both_success_shapes() {
    assert_eq!(classify(&event("charge.succeeded")), EventKind::ChargeSucceeded);
    assert_eq!(classify(&event("payment_intent.succeeded")), EventKind::ChargeSucceeded);
    assert_eq!(classify(&event("checkout.session.completed")), EventKind::CheckoutCompleted);
    assert_eq!(classify(&event("charge.failed")), EventKind::ChargeFailed);
    assert_eq!(classify(&event("customer.created")), EventKind::Unhandled);
  }

  #[test]
  fn metadata_and_intent_accessors() {
    let e = event("checkout.session.completed");
    assert_eq!(e.pack_order_id(), Some("5f7e2c1a-8b4d-4a2e-9c3f-1d2e3f4a5b6c"));
    assert_eq!(e.payment_intent(), Some("pi_789"));
  }

  #[test]
  fn pending_orders_settle_on_success_or_failure() {
    assert_eq!(
      next_status(PaymentStatus::Pending, EventKind::ChargeSucceeded),
      Some(PaymentStatus::Completed)
    );
    assert_eq!(
      next_status(PaymentStatus::Pending, EventKind::CheckoutCompleted),
      Some(PaymentStatus::Completed)
    );
    assert_eq!(
      next_status(PaymentStatus::Pending, EventKind::ChargeFailed),
      Some(PaymentStatus::Failed)
    );
    assert_eq!(next_status(PaymentStatus::Pending, EventKind::Unhandled), None);
  }

  #[test]
  fn redelivered_success_is_a_no_op() {
    assert_eq!(next_status(PaymentStatus::Completed, EventKind::ChargeSucceeded), None);
    assert_eq!(next_status(PaymentStatus::Completed, EventKind::CheckoutCompleted), None);
  }

  #[test]
  fn terminal_states_never_regress() {
    // A late failure after settlement must not overwrite it, and vice versa.
    assert_eq!(next_status(PaymentStatus::Completed, EventKind::ChargeFailed), None);
    assert_eq!(next_status(PaymentStatus::Failed, EventKind::ChargeSucceeded), None);
    assert_eq!(next_status(PaymentStatus::Failed, EventKind::ChargeFailed), None);
  }

  #[test]
  fn pending_orders_reconcile_by_settling() {
    assert_eq!(
      reconcile_action(PaymentStatus::Pending, EventKind::ChargeSucceeded),
      ReconcileAction::Settle(PaymentStatus::Completed)
    );
    assert_eq!(
      reconcile_action(PaymentStatus::Pending, EventKind::ChargeFailed),
      ReconcileAction::Settle(PaymentStatus::Failed)
    );
    assert_eq!(
      reconcile_action(PaymentStatus::Pending, EventKind::Unhandled),
      ReconcileAction::Ignore
    );
  }

  #[test]
  fn redelivery_to_a_settled_order_still_remirrors() {
    // A delivery can settle the order and then die before the campaign
    // mirror is written. The redelivered event must reach the mirror step
    // with the order's terminal status instead of stopping short.
    assert_eq!(
      reconcile_action(PaymentStatus::Completed, EventKind::ChargeSucceeded),
      ReconcileAction::Remirror(PaymentStatus::Completed)
    );
    assert_eq!(
      reconcile_action(PaymentStatus::Completed, EventKind::CheckoutCompleted),
      ReconcileAction::Remirror(PaymentStatus::Completed)
    );
    // Terminal monotonicity holds: a late conflicting event re-asserts the
    // existing status, never the conflicting one.
    assert_eq!(
      reconcile_action(PaymentStatus::Failed, EventKind::ChargeSucceeded),
      ReconcileAction::Remirror(PaymentStatus::Failed)
    );
  }

  #[test]
  fn envelope_parses_without_metadata() {
    let e: ProviderEvent = serde_json::from_value(serde_json::json!({
      "id": "evt_9",
      "type": "charge.succeeded",
      "data": { "object": { "id": "ch_1", "payment_intent": null } }
    }))
    .unwrap();
    assert_eq!(e.pack_order_id(), None);
    assert_eq!(e.payment_intent(), None);
  }
}
