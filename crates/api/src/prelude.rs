//! Prelude module for convenient imports.
//!
//! # Example
//!
//! ```rust
//! use solpay_api::prelude::*;
//! ```

pub use crate::auth::{API_KEY_HEADER, AuthConfig, AuthError, AuthState, require_api_key};
pub use crate::error::{ApiError, ErrorBody};
pub use crate::handlers::{BalanceQuery, BalanceResponse, HealthResponse, TransferBody};
pub use crate::routes::router;
pub use crate::server::{ApiServer, ServerConfig};
pub use crate::state::AppState;
