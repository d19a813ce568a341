// app/src/pipelines/contexts.rs

//! Underlying data structs for the application's flows. Handlers receive
//! these wrapped in `stepflow::FlowData`.

use crate::models::{County, PaymentStatus};
use crate::services::provider_events::{EventKind, ProviderEvent};
use crate::state::AppState;
use crate::wizard::{CampaignDraft, PackSelection, ShippingAddress};
use uuid::Uuid;

// --- Auth flows ---

#[derive(Clone)]
pub struct SignupCtx {
  pub app_state: AppState,
  pub email: String,
  pub password: String,
  pub full_name: String,
  pub county: County,
  pub eircode: String,
  pub created_user_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct SigninCtx {
  pub app_state: AppState,
  pub email: String,
  pub password: String,
  pub user_id: Option<Uuid>,
  pub session_token: Option<String>,
}

// --- Campaign/order submission ---

#[derive(Clone)]
pub struct SubmissionCtx {
  pub app_state: AppState,
  pub acting_user_id: Uuid,
  pub draft: CampaignDraft,
  pub pack: PackSelection,
  pub shipping: ShippingAddress,
  // Populated by the flow:
  pub campaign_id: Option<Uuid>,
  pub pack_order_id: Option<Uuid>,
}

// --- Webhook reconciliation ---

/// The order fields the reconciler reads before deciding a transition.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedOrder {
  pub id: Uuid,
  pub campaign_id: Uuid,
  pub payment_status: PaymentStatus,
}

#[derive(Clone)]
pub struct WebhookCtx {
  pub app_state: AppState,
  pub raw_payload: actix_web::web::Bytes,
  pub signature_header: Option<String>,
  // Populated by the flow:
  pub event: Option<ProviderEvent>,
  pub kind: Option<EventKind>,
  pub order: Option<ResolvedOrder>,
  /// Terminal status the campaign mirror must reflect after this delivery.
  pub applied_status: Option<PaymentStatus>,
  /// True only when this delivery moved the order out of `pending` (as
  /// opposed to re-asserting the mirror on a redelivery).
  pub transition_applied: bool,
  /// Set when the event could not be mapped to an order and was dropped.
  pub dropped: bool,
}
