// src/control.rs

//! Signals for controlling flow progression and the outcome of a run.

/// Signal from a handler indicating whether the flow should continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepControl {
  /// Continue with the remaining handlers and steps.
  Continue,
  /// Stop the flow immediately. No further handlers run.
  Halt,
}

/// Outcome of a full flow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
  /// Every non-skipped step ran to completion.
  Completed,
  /// A handler returned `StepControl::Halt`.
  Halted,
}
