// src/flow.rs

//! The `Flow<TData, Err>` definition, handler registration, and executor.

use crate::control::{FlowOutcome, StepControl};
use crate::data::FlowData;
use crate::error::FlowError;
use crate::step::{Handler, SkipCondition, StepDef};
use std::collections::HashMap;
use std::future::Future;
use tracing::{event, instrument, span, Instrument, Level};

/// An ordered, named-step flow over a shared context of type `TData`.
///
/// `Err` is the error type the flow's handlers return. It must be
/// `From<FlowError>` so that framework-level failures (e.g. a non-optional
/// step with no handler) can surface through the same channel.
pub struct Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) steps: Vec<StepDef<TData>>,
  pub(crate) handlers: HashMap<String, Vec<Handler<TData, Err>>>,
}

impl<TData, Err> Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Creates a new `Flow` from `(name, optional, skip_if)` step definitions.
  pub fn new(step_defs: &[(&str, bool, Option<SkipCondition<TData>>)]) -> Self {
    let steps = step_defs
      .iter()
      .map(|(name, optional, skip_cond_opt)| StepDef {
        name: (*name).to_string(),
        optional: *optional,
        skip_if: skip_cond_opt.clone(),
      })
      .collect();

    Self {
      steps,
      handlers: HashMap::new(),
    }
  }

  /// Panics if the named step is not part of this flow. A wrong step name at
  /// registration time is a programming error, not a runtime condition.
  pub(crate) fn ensure_step_exists(&self, step_name: &str) {
    if !self.steps.iter().any(|s| s.name == step_name) {
      panic!("Stepflow setup error: Step '{}' not found in flow definition.", step_name);
    }
  }

  fn ensure_step_not_exists(&self, step_name: &str) {
    if self.steps.iter().any(|s| s.name == step_name) {
      panic!("Stepflow setup error: Step '{}' already exists in flow definition.", step_name);
    }
  }

  /// Registers a handler for a step. A step may carry several handlers; they
  /// run in registration order.
  ///
  /// The handler's own error type only needs `Into<Err>`.
  pub fn on<F, UserErr>(&mut self, step_name: &str, handler_fn: impl Fn(FlowData<TData>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<StepControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    let final_handler: Handler<TData, Err> = Box::new(move |flow_data| {
      let user_fut = handler_fn(flow_data);
      Box::pin(async move { user_fut.await.map_err(Into::into) })
    });
    self.handlers.entry(step_name.to_string()).or_default().push(final_handler);
  }

  // --- Structural modification ---

  pub fn insert_before_step<S: Into<String>>(
    &mut self,
    existing_step_name: &str,
    new_step_name: S,
    optional: bool,
    skip_if: Option<SkipCondition<TData>>,
  ) {
    self.ensure_step_exists(existing_step_name);
    let idx = self.steps.iter().position(|s| s.name == existing_step_name).unwrap();
    let name_str: String = new_step_name.into();
    self.ensure_step_not_exists(&name_str);
    self.steps.insert(
      idx,
      StepDef {
        name: name_str,
        optional,
        skip_if,
      },
    );
  }

  pub fn insert_after_step<S: Into<String>>(
    &mut self,
    existing_step_name: &str,
    new_step_name: S,
    optional: bool,
    skip_if: Option<SkipCondition<TData>>,
  ) {
    self.ensure_step_exists(existing_step_name);
    let idx = self.steps.iter().position(|s| s.name == existing_step_name).unwrap();
    let name_str: String = new_step_name.into();
    self.ensure_step_not_exists(&name_str);
    self.steps.insert(
      idx + 1,
      StepDef {
        name: name_str,
        optional,
        skip_if,
      },
    );
  }

  /// Removes a step and its handlers. Removing an unknown step is a no-op.
  pub fn remove_step(&mut self, step_name: &str) {
    if let Some(idx) = self.steps.iter().position(|s| s.name == step_name) {
      self.steps.remove(idx);
      self.handlers.remove(step_name);
    }
  }

  pub fn set_optional(&mut self, step_name: &str, optional: bool) {
    self.ensure_step_exists(step_name);
    self.steps.iter_mut().find(|s| s.name == step_name).unwrap().optional = optional;
  }

  pub fn set_skip_condition(&mut self, step_name: &str, skip_if: Option<SkipCondition<TData>>) {
    self.ensure_step_exists(step_name);
    self.steps.iter_mut().find(|s| s.name == step_name).unwrap().skip_if = skip_if;
  }

  /// Executes the flow against the given shared context.
  #[instrument(
    name = "Flow::run",
    skip_all,
    fields(
      flow_context_type = %std::any::type_name::<TData>(),
      flow_error_type = %std::any::type_name::<Err>(),
      num_steps = self.steps.len(),
    ),
    err(Display)
  )]
  pub async fn run(&self, flow_data: FlowData<TData>) -> Result<FlowOutcome, Err> {
    event!(Level::DEBUG, "Flow execution starting.");

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name_str = step_def.name.as_str();

      // The span guard must not be held across an await (it is !Send), so
      // handler futures are instrumented with a clone of the span instead.
      let step_span = span!(
        Level::INFO,
        "flow_step",
        step_name = step_name_str,
        step_index = step_idx,
        optional = step_def.optional
      );

      if let Some(skip_cond_fn) = &step_def.skip_if {
        if skip_cond_fn(flow_data.clone()) {
          event!(parent: &step_span, Level::INFO, "Step skipped due to 'skip_if' condition.");
          continue;
        }
      }

      let step_handlers = match self.handlers.get(step_name_str) {
        Some(handlers) if !handlers.is_empty() => handlers,
        _ => {
          if step_def.optional {
            event!(parent: &step_span, Level::DEBUG, "Optional step has no handlers, skipping.");
            continue;
          }
          event!(parent: &step_span, Level::ERROR, "Non-optional step has no handlers.");
          return Err(Err::from(FlowError::HandlerMissing {
            step_name: step_def.name.clone(),
          }));
        }
      };

      for (handler_idx, handler_fn) in step_handlers.iter().enumerate() {
        let handler_span = span!(parent: &step_span, Level::DEBUG, "step_handler", handler_index = handler_idx);
        match handler_fn(flow_data.clone()).instrument(handler_span).await {
          Ok(StepControl::Continue) => {}
          Ok(StepControl::Halt) => {
            event!(parent: &step_span, Level::INFO, "Flow halted by a handler.");
            return Ok(FlowOutcome::Halted);
          }
          Err(e) => {
            event!(parent: &step_span, Level::ERROR, error = %e, "Step handler failed.");
            return Err(e);
          }
        }
      }
      event!(parent: &step_span, Level::DEBUG, "Step processing finished successfully.");
    }

    event!(Level::DEBUG, "Flow execution completed successfully.");
    Ok(FlowOutcome::Completed)
  }
}
