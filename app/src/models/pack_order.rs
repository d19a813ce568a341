// app/src/models/pack_order.rs

use crate::models::campaign::County;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "payment_status_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
  Pending,
  Completed,
  Failed,
}

impl PaymentStatus {
  /// `completed` and `failed` are terminal: once reached, no further
  /// transition is ever applied to a pack order.
  pub fn is_terminal(self) -> bool {
    matches!(self, PaymentStatus::Completed | PaymentStatus::Failed)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "pack_tier_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PackTier {
  Free,
  Medium,
  Large,
}

impl PackTier {
  /// Price in cents. The free tier still carries a postage charge.
  pub fn price_cents(self) -> i64 {
    match self {
      PackTier::Free => 1_000,
      PackTier::Medium => 3_500,
      PackTier::Large => 6_000,
    }
  }

  /// Number of garment-size selections the tier requires.
  pub fn garment_slots(self) -> usize {
    match self {
      PackTier::Free => 0,
      PackTier::Medium => 2,
      PackTier::Large => 4,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GarmentSize {
  Small,
  Medium,
  Large,
  XLarge,
  XxLarge,
}

impl GarmentSize {
  pub fn as_str(self) -> &'static str {
    match self {
      GarmentSize::Small => "small",
      GarmentSize::Medium => "medium",
      GarmentSize::Large => "large",
      GarmentSize::XLarge => "xlarge",
      GarmentSize::XxLarge => "xxlarge",
    }
  }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PackOrder {
  pub id: Uuid,
  pub campaign_id: Uuid,
  pub tier: PackTier,
  /// Garment sizes stored as their lowercase names.
  pub sizes: Vec<String>,
  pub ship_name: String,
  pub ship_line1: String,
  pub ship_line2: Option<String>,
  pub ship_city: String,
  pub ship_county: County,
  pub ship_eircode: String,
  pub ship_country: String,
  pub amount_cents: i64,
  pub payment_status: PaymentStatus,
  /// Provider-assigned payment-intent reference, stored when a
  /// checkout-session event first carries one so later intent-keyed events
  /// can be resolved.
  pub payment_intent_ref: Option<String>,
  pub paid_at: Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}
