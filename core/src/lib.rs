// src/lib.rs

//! Stepflow: a small asynchronous, type-safe step-flow engine.
//!
//! A `Flow<TData, Err>` is an ordered list of named steps, each backed by one
//! or more asynchronous handlers operating on a shared `FlowData<TData>`
//! context. Handlers signal `StepControl::Continue` to proceed or
//! `StepControl::Halt` to stop the flow early; the run as a whole resolves to
//! a `FlowOutcome`. Flows for different context types can be registered with a
//! `FlowRegistry` and dispatched by the context's type alone.

pub mod data;
pub mod control;
pub mod step;
pub mod flow;
pub mod registry;
pub mod error;

// --- Re-exports for the public API ---

pub use crate::control::{FlowOutcome, StepControl};
pub use crate::data::FlowData;
pub use crate::error::{FlowError, FlowResult};
pub use crate::flow::Flow;
pub use crate::registry::FlowRegistry;
pub use crate::step::{Handler, SkipCondition, StepDef};
