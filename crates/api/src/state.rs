//! Application state.

use solpay_domain::Address;
use solpay_execution::engine::TransferEngine;
use std::sync::Arc;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Transfer engine.
    pub engine: Arc<TransferEngine>,
    /// Account reported by `GET /balance` when no address is given.
    pub default_account: Option<Address>,
    /// When the server started.
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// Creates state around `engine`.
    ///
    /// The default balance account is the configured treasury, falling
    /// back to the connected signer.
    pub fn new(engine: Arc<TransferEngine>) -> Self {
        let default_account = engine
            .config()
            .treasury
            .or_else(|| engine.bridge().connected_address());
        Self {
            engine,
            default_account,
            started_at: chrono::Utc::now(),
        }
    }
}
