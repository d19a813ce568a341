// app/src/state.rs

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::services::events::EventBus;
use sqlx::PgPool;
use std::sync::Arc;
use stepflow::FlowRegistry;

#[derive(Clone)]
pub struct AppState {
  pub db_pool: PgPool,
  pub flows: Arc<FlowRegistry<AppError>>,
  pub config: Arc<AppConfig>,
  pub events: EventBus,
}
