//! REST API server and endpoints.
//!
//! This crate provides an HTTP surface over the transfer engine:
//! - Health and submission statistics
//! - Account balance lookup
//! - Transfer submission behind an API key guard

/// Prelude module for convenient imports.
pub mod prelude;

/// Authentication module.
pub mod auth;
/// Error types.
pub mod error;
/// Request handlers.
pub mod handlers;
/// Route definitions.
pub mod routes;
/// Server configuration and startup.
pub mod server;
/// Application state.
pub mod state;

pub use auth::{AuthConfig, AuthError, AuthState};
pub use error::ApiError;
pub use server::{ApiServer, ServerConfig};
pub use state::AppState;
