// src/registry.rs

//! The `FlowRegistry<E>`, a type-keyed registry for managing and executing
//! flows. Flows are keyed by their context type `TData`; the registry returns
//! results with an application-level error type `E`.

use crate::control::FlowOutcome;
use crate::data::FlowData;
use crate::error::FlowError;
use crate::flow::Flow;

use async_trait::async_trait;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};
use tracing::{event, instrument, Level};

/// Type-erased runner so the registry can hold flows over different context
/// types in one map.
#[async_trait]
trait AnyFlowRunner<AppErr>: Send + Sync
where
  AppErr: std::error::Error + Send + Sync + 'static,
{
  /// Runs the flow with an owned, type-erased context. The box is expected to
  /// contain a `FlowData<TData>` matching the registered flow.
  async fn run_erased(&self, ctx_obj: Box<dyn Any + Send>) -> Result<FlowOutcome, AppErr>;
}

struct FlowWrapper<TData, HandlerErr, AppErr>
where
  TData: 'static + Send + Sync,
  HandlerErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
  AppErr: std::error::Error + From<HandlerErr> + From<FlowError> + Send + Sync + 'static,
{
  flow: Arc<Flow<TData, HandlerErr>>,
  _phantom_app_err: PhantomData<AppErr>,
}

#[async_trait]
impl<TData, HandlerErr, AppErr> AnyFlowRunner<AppErr> for FlowWrapper<TData, HandlerErr, AppErr>
where
  TData: 'static + Send + Sync,
  HandlerErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
  AppErr: std::error::Error + From<HandlerErr> + From<FlowError> + Send + Sync + 'static,
{
  #[instrument(
    name = "FlowWrapper::run_erased",
    skip_all,
    fields(target_context_type = %std::any::type_name::<TData>()),
    err(Display)
  )]
  async fn run_erased(&self, ctx_obj: Box<dyn Any + Send>) -> Result<FlowOutcome, AppErr> {
    let typed_flow_data = match ctx_obj.downcast::<FlowData<TData>>() {
      Ok(boxed_flow_data) => *boxed_flow_data,
      Err(_) => {
        let expected_type_name = std::any::type_name::<FlowData<TData>>();
        event!(Level::ERROR, "Context object type mismatch. Expected {}.", expected_type_name);
        return Err(AppErr::from(FlowError::TypeMismatch {
          expected_type: expected_type_name.to_string(),
        }));
      }
    };

    self.flow.run(typed_flow_data).await.map_err(AppErr::from)
  }
}

/// The flow registry.
///
/// `AppErr` is the error type `FlowRegistry::run` returns. It must be
/// constructible from `FlowError` so framework failures (no flow registered,
/// type mismatch) surface through the same channel.
pub struct FlowRegistry<AppErr = FlowError>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  registry: Mutex<HashMap<TypeId, Arc<dyn AnyFlowRunner<AppErr>>>>,
}

impl<AppErr> FlowRegistry<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Creates a new, empty registry.
  pub fn new() -> Self {
    Self {
      registry: Mutex::new(HashMap::new()),
    }
  }

  /// Registers a flow, keyed by its context type. Re-registering for the same
  /// context type replaces the previous flow.
  pub fn register<TData, HandlerErr>(&self, flow: Flow<TData, HandlerErr>)
  where
    TData: 'static + Send + Sync,
    HandlerErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
    AppErr: From<HandlerErr>,
  {
    event!(
      Level::DEBUG,
      context_type = %std::any::type_name::<TData>(),
      handler_error_type = %std::any::type_name::<HandlerErr>(),
      "Registering flow."
    );
    let wrapper = FlowWrapper::<TData, HandlerErr, AppErr> {
      flow: Arc::new(flow),
      _phantom_app_err: PhantomData,
    };
    self
      .registry
      .lock()
      .unwrap()
      .insert(TypeId::of::<TData>(), Arc::new(wrapper));
  }

  /// Runs the flow registered for context type `TData`.
  pub async fn run<TData>(&self, flow_data: FlowData<TData>) -> Result<FlowOutcome, AppErr>
  where
    TData: 'static + Send + Sync,
  {
    event!(Level::DEBUG, context_type = %std::any::type_name::<TData>(), "Dispatching flow.");
    let type_id = TypeId::of::<TData>();

    let runner_arc: Arc<dyn AnyFlowRunner<AppErr>>;
    {
      let reg_lock = self.registry.lock().unwrap();
      runner_arc = reg_lock.get(&type_id).cloned().ok_or_else(|| {
        let type_name = std::any::type_name::<TData>();
        event!(Level::ERROR, "No flow registered for context type {}.", type_name);
        AppErr::from(FlowError::Configuration {
          message: format!("No flow registered for context type {}", type_name),
        })
      })?;
    }

    let owned_ctx_obj: Box<dyn Any + Send> = Box::new(flow_data.clone());
    runner_arc.run_erased(owned_ctx_obj).await
  }
}

impl<AppErr> Default for FlowRegistry<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}
