// app/src/services/mod.rs

pub mod auth;
pub mod events;
pub mod provider_events;
pub mod session_watch;
pub mod signature;
