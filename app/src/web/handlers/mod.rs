// app/src/web/handlers/mod.rs

pub mod auth_handlers;
pub mod campaign_handlers;
pub mod webhook_handlers;
