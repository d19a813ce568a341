// app/src/wizard/forms.rs

//! Draft form state held by a wizard session, plus the per-step
//! field-completeness predicates the sequencer gates progression on.
//!
//! Drafts live only in the wizard's working memory and are discarded on
//! submission or cancellation.

use crate::models::{County, GarmentSize, PackTier};
use chrono::{DateTime, Utc};

/// Accepted fundraising goal range, in whole euro.
pub const GOAL_MIN: i64 = 100;
pub const GOAL_MAX: i64 = 50_000;

#[derive(Debug, Clone, Default)]
pub struct CampaignDraft {
  pub title: String,
  pub organizer_name: String,
  pub organizer_email: String,
  pub story: String,
  pub county: Option<County>,
  pub eircode: String,
  pub event_at: Option<DateTime<Utc>>,
  pub location: String,
  /// Raw goal input as typed, validated on every change.
  pub goal_amount: String,
  pub facebook_url: Option<String>,
  pub twitter_url: Option<String>,
  pub instagram_url: Option<String>,
  pub whatsapp_url: Option<String>,
}

impl CampaignDraft {
  /// Eircodes are free text but upper-cased on entry.
  pub fn set_eircode(&mut self, raw: &str) {
    self.eircode = raw.trim().to_uppercase();
  }

  pub fn basic_info_complete(&self) -> bool {
    !self.title.trim().is_empty()
      && !self.organizer_name.trim().is_empty()
      && !self.organizer_email.trim().is_empty()
      && !self.story.trim().is_empty()
  }

  pub fn event_details_complete(&self) -> bool {
    match self.event_at {
      Some(when) => when >= Utc::now() && !self.location.trim().is_empty(),
      None => false,
    }
  }

  /// Parses the raw goal input; `None` when not a number or out of range.
  pub fn parsed_goal(&self) -> Option<i64> {
    let goal: i64 = self.goal_amount.trim().parse().ok()?;
    if (GOAL_MIN..=GOAL_MAX).contains(&goal) {
      Some(goal)
    } else {
      None
    }
  }

  pub fn goal_complete(&self) -> bool {
    self.parsed_goal().is_some()
  }
}

/// Account fields collected by the embedded Auth step for sessions that were
/// unauthenticated at wizard mount. Validation is internal to the Auth step.
#[derive(Debug, Clone, Default)]
pub struct AuthDraft {
  pub email: String,
  pub confirm_email: String,
  pub password: String,
  pub confirm_password: String,
  pub full_name: String,
  pub county: Option<County>,
  pub eircode: String,
}

impl AuthDraft {
  pub fn set_eircode(&mut self, raw: &str) {
    self.eircode = raw.trim().to_uppercase();
  }

  pub fn emails_match(&self) -> bool {
    !self.email.trim().is_empty() && self.email == self.confirm_email
  }

  pub fn passwords_match(&self) -> bool {
    !self.password.is_empty() && self.password == self.confirm_password
  }

  pub fn ready_to_submit(&self) -> bool {
    self.emails_match() && self.passwords_match() && !self.full_name.trim().is_empty() && self.county.is_some()
  }
}

/// The chosen starter pack. A tier is always pre-selected, so the
/// PackSelection step has no advancement predicate of its own.
#[derive(Debug, Clone)]
pub struct PackSelection {
  pub tier: PackTier,
  pub sizes: Vec<GarmentSize>,
}

impl Default for PackSelection {
  fn default() -> Self {
    Self {
      tier: PackTier::Free,
      sizes: Vec::new(),
    }
  }
}

impl PackSelection {
  pub fn sizes_complete(&self) -> bool {
    self.sizes.len() == self.tier.garment_slots()
  }

  pub fn amount_cents(&self) -> i64 {
    self.tier.price_cents()
  }
}

/// Shipping details for the pack. Required in full before payment for every
/// tier; even the free pack incurs postage.
#[derive(Debug, Clone, Default)]
pub struct ShippingAddress {
  pub name: String,
  pub line1: String,
  pub line2: Option<String>,
  pub city: String,
  pub county: Option<County>,
  pub eircode: String,
  pub country: String,
}

impl ShippingAddress {
  pub fn with_default_country(country: &str) -> Self {
    Self {
      country: country.to_string(),
      ..Default::default()
    }
  }

  pub fn set_eircode(&mut self, raw: &str) {
    self.eircode = raw.trim().to_uppercase();
  }

  pub fn is_complete(&self) -> bool {
    !self.name.trim().is_empty()
      && !self.line1.trim().is_empty()
      && !self.city.trim().is_empty()
      && self.county.is_some()
      && !self.eircode.trim().is_empty()
      && !self.country.trim().is_empty()
  }
}
