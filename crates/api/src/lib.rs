//! HTTP API layer for wastewatch.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: report lifecycle and account management
//! - **Extractors**: authentication
//! - **Middleware**: Bearer-token resolution, application state
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
