// app/src/models/campaign.rs

use crate::models::pack_order::PaymentStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use uuid::Uuid;

/// The 26 counties campaigns can be registered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "county_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum County {
  Carlow,
  Cavan,
  Clare,
  Cork,
  Donegal,
  Dublin,
  Galway,
  Kerry,
  Kildare,
  Kilkenny,
  Laois,
  Leitrim,
  Limerick,
  Longford,
  Louth,
  Mayo,
  Meath,
  Monaghan,
  Offaly,
  Roscommon,
  Sligo,
  Tipperary,
  Waterford,
  Westmeath,
  Wexford,
  Wicklow,
}

impl County {
  pub const ALL: [County; 26] = [
    County::Carlow,
    County::Cavan,
    County::Clare,
    County::Cork,
    County::Donegal,
    County::Dublin,
    County::Galway,
    County::Kerry,
    County::Kildare,
    County::Kilkenny,
    County::Laois,
    County::Leitrim,
    County::Limerick,
    County::Longford,
    County::Louth,
    County::Mayo,
    County::Meath,
    County::Monaghan,
    County::Offaly,
    County::Roscommon,
    County::Sligo,
    County::Tipperary,
    County::Waterford,
    County::Westmeath,
    County::Wexford,
    County::Wicklow,
  ];
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Campaign {
  pub id: Uuid,
  pub user_id: Uuid,
  pub title: String,
  pub organizer_name: String,
  pub organizer_email: String,
  pub story: String,
  pub county: County,
  pub eircode: String,
  pub event_at: DateTime<Utc>,
  pub location: String,
  /// Fundraising goal in whole euro.
  pub goal_amount: i32,
  pub facebook_url: Option<String>,
  pub twitter_url: Option<String>,
  pub instagram_url: Option<String>,
  pub whatsapp_url: Option<String>,
  pub is_active: bool,
  /// Freshly created campaigns are unapproved and hidden from public
  /// listings until reviewed.
  pub is_approved: bool,
  pub raised_amount_cents: i64,
  pub pack_order_id: Option<Uuid>,
  /// Denormalized mirror of the linked pack order's payment status. The
  /// webhook reconciler is the sole writer once an order exists.
  pub pack_payment_status: Option<PaymentStatus>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}
