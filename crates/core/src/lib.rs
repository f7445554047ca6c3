//! Core business logic for wastewatch.

pub mod services;

pub use services::*;
