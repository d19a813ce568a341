// app/src/wizard/sequencer.rs

//! The wizard's step sequencing state machine.
//!
//! The sequencer owns the draft state and the current 1-based slot, gates
//! advancement on per-step field predicates, and coordinates the two
//! suspension points of a session: the embedded Auth step (reported back via
//! `auth_completed`) and the submission call fired on the transition from the
//! second-to-last slot (reported back via `submission_succeeded` /
//! `submission_failed`).

use crate::wizard::forms::{AuthDraft, CampaignDraft, PackSelection, ShippingAddress};
use crate::wizard::steps::{self, WizardStep};
use uuid::Uuid;

/// Result of an advance attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
  /// Moved forward one slot.
  Moved,
  /// The current step's required fields are not satisfied.
  Blocked,
  /// The driver must perform the campaign/order submission call and report
  /// the outcome. The slot does not change until it does.
  SubmitRequired,
  /// A submission is already outstanding; user-triggered transitions are
  /// disabled until it resolves.
  Busy,
  /// Already on the final (Payment) slot.
  AtEnd,
}

/// Result of a back attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Back {
  /// Moved back one slot.
  Moved,
  /// Back from slot 1 closes the wizard and discards the draft.
  Cancel,
}

/// Identifiers returned by a successful submission, binding the Payment step
/// to the created records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedIds {
  pub campaign_id: Uuid,
  pub pack_order_id: Uuid,
}

#[derive(Debug)]
pub struct WizardSequencer {
  authenticated: bool,
  slot: usize,
  busy: bool,
  pub campaign: CampaignDraft,
  pub auth: AuthDraft,
  pub pack: PackSelection,
  pub shipping: ShippingAddress,
  created: Option<CreatedIds>,
  last_error: Option<String>,
}

impl WizardSequencer {
  /// Opens the wizard. The authentication state is captured once, here; a
  /// mid-flow sign-in goes through `auth_completed`, never through mutating
  /// the flag directly.
  pub fn new(authenticated: bool) -> Self {
    Self {
      authenticated,
      slot: 1,
      busy: false,
      campaign: CampaignDraft::default(),
      auth: AuthDraft::default(),
      pack: PackSelection::default(),
      shipping: ShippingAddress::default(),
      created: None,
      last_error: None,
    }
  }

  pub fn authenticated(&self) -> bool {
    self.authenticated
  }

  pub fn current_slot(&self) -> usize {
    self.slot
  }

  pub fn total_steps(&self) -> usize {
    steps::total_steps(self.authenticated)
  }

  pub fn current_step(&self) -> WizardStep {
    // The slot is kept in range by construction.
    steps::step_at(self.authenticated, self.slot).expect("sequencer slot out of range")
  }

  pub fn step_title(&self) -> &'static str {
    self.current_step().title()
  }

  pub fn is_busy(&self) -> bool {
    self.busy
  }

  pub fn created_ids(&self) -> Option<CreatedIds> {
    self.created
  }

  pub fn last_error(&self) -> Option<&str> {
    self.last_error.as_deref()
  }

  /// Whether the "Next" control is enabled. Re-evaluated on every field
  /// change, not just on an advance attempt.
  pub fn can_proceed(&self) -> bool {
    if self.busy {
      return false;
    }
    match self.current_step() {
      // The Auth step manages its own submission and signals completion via
      // `auth_completed`; "Next" stays disabled while it is showing.
      WizardStep::Auth => false,
      WizardStep::BasicInfo => self.campaign.basic_info_complete(),
      WizardStep::EventDetails => self.campaign.event_details_complete(),
      WizardStep::FundraisingGoal => self.campaign.goal_complete(),
      WizardStep::SocialMedia => true,
      WizardStep::PackSelection => true,
      WizardStep::Payment => false,
    }
  }

  /// Attempts to move forward. The transition from slot total−1 to total is
  /// the submission trigger ("Create Campaign & Continue"): the sequencer
  /// flags itself busy and stays put until the driver reports back.
  pub fn advance(&mut self) -> Advance {
    if self.busy {
      return Advance::Busy;
    }
    let total = self.total_steps();
    if self.slot >= total {
      return Advance::AtEnd;
    }
    if !self.can_proceed() {
      return Advance::Blocked;
    }
    if self.slot == total - 1 {
      self.busy = true;
      self.last_error = None;
      return Advance::SubmitRequired;
    }
    self.slot += 1;
    Advance::Moved
  }

  /// Attempts to move back. Always permitted except from slot 1, where Back
  /// means Cancel.
  pub fn back(&mut self) -> Back {
    if self.slot <= 1 {
      return Back::Cancel;
    }
    self.slot -= 1;
    Back::Moved
  }

  /// One-shot completion callback from the embedded Auth step. Recomputes
  /// the step table for the authenticated sequence and resets the slot to
  /// the one rendering BasicInfo; preserving the numeric index would
  /// silently skip or duplicate a step.
  pub fn auth_completed(&mut self) {
    if self.authenticated {
      return;
    }
    self.authenticated = true;
    self.slot = steps::slot_of(true, WizardStep::BasicInfo).expect("BasicInfo missing from step table");
  }

  /// Driver callback: the submission call succeeded. Binds the created
  /// identifiers and moves onto the Payment slot.
  pub fn submission_succeeded(&mut self, ids: CreatedIds) {
    self.busy = false;
    self.created = Some(ids);
    self.last_error = None;
    self.slot = self.total_steps();
  }

  /// Driver callback: the submission call failed. The slot and every draft
  /// field are left untouched so the user can retry from the same step.
  pub fn submission_failed(&mut self, message: impl Into<String>) {
    self.busy = false;
    self.last_error = Some(message.into());
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::County;
  use chrono::{Duration, Utc};

  fn fill_campaign(seq: &mut WizardSequencer) {
    seq.campaign.title = "Sarah's Coffee Morning".to_string();
    seq.campaign.organizer_name = "Sarah Byrne".to_string();
    seq.campaign.organizer_email = "sarah@example.com".to_string();
    seq.campaign.story = "Coffee and cake for the local hospice.".to_string();
    seq.campaign.county = Some(County::Dublin);
    seq.campaign.set_eircode("d02 x285");
    seq.campaign.event_at = Some(Utc::now() + Duration::days(14));
    seq.campaign.location = "Community Hall".to_string();
    seq.campaign.goal_amount = "2000".to_string();
  }

  fn ids() -> CreatedIds {
    CreatedIds {
      campaign_id: Uuid::new_v4(),
      pack_order_id: Uuid::new_v4(),
    }
  }

  #[test]
  fn total_steps_reflects_auth_state_at_mount() {
    assert_eq!(WizardSequencer::new(true).total_steps(), 6);
    assert_eq!(WizardSequencer::new(false).total_steps(), 7);
  }

  #[test]
  fn guest_wizard_opens_on_auth_step_with_next_disabled() {
    let seq = WizardSequencer::new(false);
    assert_eq!(seq.current_step(), WizardStep::Auth);
    assert!(!seq.can_proceed());
  }

  #[test]
  fn auth_completion_resets_to_basic_info_not_numeric_index() {
    let mut seq = WizardSequencer::new(false);
    seq.auth_completed();
    assert!(seq.authenticated());
    assert_eq!(seq.total_steps(), 6);
    assert_eq!(seq.current_slot(), 1);
    assert_eq!(seq.current_step(), WizardStep::BasicInfo);
  }

  #[test]
  fn can_proceed_tracks_field_edits() {
    let mut seq = WizardSequencer::new(true);
    assert_eq!(seq.current_step(), WizardStep::BasicInfo);
    assert!(!seq.can_proceed());
    fill_campaign(&mut seq);
    assert!(seq.can_proceed());
  }

  #[test]
  fn goal_gate_enforces_range_on_every_change() {
    let mut seq = WizardSequencer::new(true);
    fill_campaign(&mut seq);
    assert_eq!(seq.advance(), Advance::Moved); // EventDetails
    assert_eq!(seq.advance(), Advance::Moved); // FundraisingGoal
    assert_eq!(seq.current_step(), WizardStep::FundraisingGoal);

    seq.campaign.goal_amount = "50".to_string();
    assert!(!seq.can_proceed());
    assert_eq!(seq.advance(), Advance::Blocked);
    seq.campaign.goal_amount = "100".to_string();
    assert!(seq.can_proceed());
    seq.campaign.goal_amount = "50001".to_string();
    assert!(!seq.can_proceed());
  }

  #[test]
  fn back_from_slot_one_is_cancel() {
    let mut seq = WizardSequencer::new(false);
    assert_eq!(seq.back(), Back::Cancel);

    let mut authed = WizardSequencer::new(true);
    fill_campaign(&mut authed);
    assert_eq!(authed.advance(), Advance::Moved);
    assert_eq!(authed.back(), Back::Moved);
    assert_eq!(authed.back(), Back::Cancel);
  }

  #[test]
  fn submission_fires_on_second_to_last_slot_and_blocks_reentry() {
    let mut seq = WizardSequencer::new(true);
    fill_campaign(&mut seq);
    for _ in 0..4 {
      assert_eq!(seq.advance(), Advance::Moved);
    }
    assert_eq!(seq.current_step(), WizardStep::PackSelection);
    assert_eq!(seq.current_slot(), seq.total_steps() - 1);

    assert_eq!(seq.advance(), Advance::SubmitRequired);
    assert!(seq.is_busy());
    assert!(!seq.can_proceed());
    assert_eq!(seq.advance(), Advance::Busy);

    let created = ids();
    seq.submission_succeeded(created);
    assert_eq!(seq.current_step(), WizardStep::Payment);
    assert_eq!(seq.created_ids(), Some(created));
  }

  #[test]
  fn failed_submission_preserves_slot_and_fields_for_retry() {
    let mut seq = WizardSequencer::new(true);
    fill_campaign(&mut seq);
    for _ in 0..4 {
      seq.advance();
    }
    assert_eq!(seq.advance(), Advance::SubmitRequired);

    seq.submission_failed("server unavailable");
    assert!(!seq.is_busy());
    assert_eq!(seq.current_step(), WizardStep::PackSelection);
    assert_eq!(seq.last_error(), Some("server unavailable"));
    assert_eq!(seq.campaign.title, "Sarah's Coffee Morning");

    // Retry is the same transition again.
    assert_eq!(seq.advance(), Advance::SubmitRequired);
    seq.submission_succeeded(ids());
    assert_eq!(seq.current_step(), WizardStep::Payment);
    assert!(seq.last_error().is_none());
  }

  #[test]
  fn full_guest_walk_matches_expected_slot_sequence() {
    let mut seq = WizardSequencer::new(false);
    assert_eq!((seq.current_slot(), seq.current_step()), (1, WizardStep::Auth));

    seq.auth_completed();
    // Post-auth the sequence is the 6-slot one; walk it to the end.
    fill_campaign(&mut seq);
    let walked: Vec<WizardStep> = std::iter::once(seq.current_step())
      .chain((0..3).map(|_| {
        assert_eq!(seq.advance(), Advance::Moved);
        seq.current_step()
      }))
      .collect();
    assert_eq!(
      walked,
      vec![
        WizardStep::BasicInfo,
        WizardStep::EventDetails,
        WizardStep::FundraisingGoal,
        WizardStep::SocialMedia,
      ]
    );

    assert_eq!(seq.advance(), Advance::Moved);
    assert_eq!(seq.current_step(), WizardStep::PackSelection);
    assert_eq!(seq.advance(), Advance::SubmitRequired);
    seq.submission_succeeded(ids());
    assert_eq!(seq.current_step(), WizardStep::Payment);
    assert_eq!(seq.advance(), Advance::AtEnd);
  }
}
