// src/error.rs

use anyhow::Error as AnyhowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
  #[error("Step not found: {step_name}")]
  StepNotFound { step_name: String },

  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("Context type mismatch during registry dispatch (expected {expected_type})")]
  TypeMismatch { expected_type: String },

  #[error("Error in user-provided handler or external operation. Source: {source}")]
  Handler {
    #[source]
    source: AnyhowError,
  },

  #[error("Flow configuration error: {message}")]
  Configuration { message: String },

  #[error("Internal stepflow error: {0}")]
  Internal(String),
}

// Lets handlers written against anyhow bubble their errors into a flow
// without wrapping by hand.
impl From<AnyhowError> for FlowError {
  fn from(err: AnyhowError) -> Self {
    FlowError::Handler { source: err }
  }
}

pub type FlowResult<T, E = FlowError> = std::result::Result<T, E>;
