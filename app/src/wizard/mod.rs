// app/src/wizard/mod.rs

//! The campaign-creation wizard: draft form state, the slot/step table, and
//! the sequencing state machine that gates progression through the steps.
//!
//! Everything here is pure and synchronous. The two network calls a wizard
//! session performs (auth, submission) are driven from outside; the sequencer
//! only records their outcomes.

pub mod forms;
pub mod sequencer;
pub mod steps;

pub use forms::{AuthDraft, CampaignDraft, PackSelection, ShippingAddress};
pub use sequencer::{Advance, Back, CreatedIds, WizardSequencer};
pub use steps::WizardStep;
