// src/step.rs

//! Step definitions and the handler type handlers are boxed into.

use crate::control::StepControl;
use crate::data::FlowData;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Condition evaluated before a step runs; `true` skips the step.
/// Operates on the flow's root context.
pub type SkipCondition<TData> = Arc<dyn Fn(FlowData<TData>) -> bool + Send + Sync + 'static>;

/// A boxed asynchronous step handler.
///
/// Handlers take a clone of the shared `FlowData<TData>`, acquire locks as
/// needed (dropping every guard before awaiting), and resolve to
/// `Result<StepControl, Err>`.
pub type Handler<TData, Err> = Box<
  dyn Fn(FlowData<TData>) -> Pin<Box<dyn Future<Output = Result<StepControl, Err>> + Send>> + Send + Sync,
>;

/// Definition of one step in a flow: its name, whether it may legally have no
/// handlers, and an optional skip condition.
#[derive(Clone)]
pub struct StepDef<T: 'static + Send + Sync> {
  pub name: String,
  pub optional: bool,
  pub skip_if: Option<SkipCondition<T>>,
}

impl<T: 'static + Send + Sync> std::fmt::Debug for StepDef<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepDef")
      .field("name", &self.name)
      .field("optional", &self.optional)
      .field("skip_if_present", &self.skip_if.is_some())
      .finish()
  }
}
