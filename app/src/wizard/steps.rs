// app/src/wizard/steps.rs

//! The logical wizard steps and the slot table mapping 1-based slot numbers
//! to steps for each authentication state.

/// A logical step of the campaign-creation wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
  Auth,
  BasicInfo,
  EventDetails,
  FundraisingGoal,
  SocialMedia,
  PackSelection,
  Payment,
}

impl WizardStep {
  pub fn title(self) -> &'static str {
    match self {
      WizardStep::Auth => "Create Your Account",
      WizardStep::BasicInfo => "Tell Us About Your Event",
      WizardStep::EventDetails => "When & Where",
      WizardStep::FundraisingGoal => "Set Your Goal",
      WizardStep::SocialMedia => "Spread the Word",
      WizardStep::PackSelection => "Choose Your Starter Pack",
      WizardStep::Payment => "Payment",
    }
  }
}

/// Slot sequence for a session that was authenticated at wizard mount.
const AUTHENTICATED_SLOTS: [WizardStep; 6] = [
  WizardStep::BasicInfo,
  WizardStep::EventDetails,
  WizardStep::FundraisingGoal,
  WizardStep::SocialMedia,
  WizardStep::PackSelection,
  WizardStep::Payment,
];

/// Slot sequence for an unauthenticated session: Auth occupies slot 1 and
/// every other step shifts by one, with Payment last in both sequences.
const GUEST_SLOTS: [WizardStep; 7] = [
  WizardStep::Auth,
  WizardStep::BasicInfo,
  WizardStep::EventDetails,
  WizardStep::FundraisingGoal,
  WizardStep::SocialMedia,
  WizardStep::PackSelection,
  WizardStep::Payment,
];

fn slots(authenticated: bool) -> &'static [WizardStep] {
  if authenticated {
    &AUTHENTICATED_SLOTS
  } else {
    &GUEST_SLOTS
  }
}

pub fn total_steps(authenticated: bool) -> usize {
  slots(authenticated).len()
}

/// Logical step occupying a 1-based slot, or `None` for an out-of-range slot.
///
/// An explicit table lookup rather than an arithmetic offset: the Payment
/// step is last in both sequences while the intermediate slots shift, so an
/// offset would invite off-by-one bugs when the flag flips mid-session.
pub fn step_at(authenticated: bool, slot: usize) -> Option<WizardStep> {
  if slot == 0 {
    return None;
  }
  slots(authenticated).get(slot - 1).copied()
}

/// 1-based slot a logical step occupies, or `None` if the step is absent
/// from the sequence (Auth for authenticated sessions).
pub fn slot_of(authenticated: bool, step: WizardStep) -> Option<usize> {
  slots(authenticated).iter().position(|s| *s == step).map(|i| i + 1)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn total_steps_depends_on_auth_flag() {
    assert_eq!(total_steps(true), 6);
    assert_eq!(total_steps(false), 7);
  }

  #[test]
  fn guest_sequence_starts_with_auth_and_ends_with_payment() {
    assert_eq!(step_at(false, 1), Some(WizardStep::Auth));
    assert_eq!(step_at(false, 2), Some(WizardStep::BasicInfo));
    assert_eq!(step_at(false, 7), Some(WizardStep::Payment));
  }

  #[test]
  fn authenticated_sequence_has_no_auth_and_ends_with_payment() {
    assert_eq!(step_at(true, 1), Some(WizardStep::BasicInfo));
    assert_eq!(step_at(true, 6), Some(WizardStep::Payment));
    assert_eq!(slot_of(true, WizardStep::Auth), None);
  }

  #[test]
  fn intermediate_slots_shift_by_exactly_one() {
    for slot in 1..=5 {
      assert_eq!(step_at(true, slot), step_at(false, slot + 1));
    }
  }

  #[test]
  fn out_of_range_slots_are_none() {
    assert_eq!(step_at(true, 0), None);
    assert_eq!(step_at(true, 7), None);
    assert_eq!(step_at(false, 8), None);
  }
}
