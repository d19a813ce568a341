// app/src/models/mod.rs

//! Data structures representing database entities.

pub mod campaign;
pub mod pack_order;
pub mod user;

pub use campaign::{Campaign, County};
pub use pack_order::{GarmentSize, PackOrder, PackTier, PaymentStatus};
pub use user::User;
