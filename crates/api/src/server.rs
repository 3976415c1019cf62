//! Server configuration and startup.

use crate::auth::{AuthConfig, AuthState};
use crate::routes::router;
use crate::state::AppState;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

/// Listen address.
pub const ENV_BIND_ADDR: &str = "SOLPAY_BIND_ADDR";
/// Comma-separated API keys.
pub const ENV_API_KEYS: &str = "SOLPAY_API_KEYS";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address.
    pub bind_addr: SocketAddr,
    /// Authentication settings.
    pub auth: AuthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            auth: AuthConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from the environment.
    ///
    /// # Errors
    /// Returns an error if the bind address does not parse.
    pub fn from_env() -> Result<Self, std::net::AddrParseError> {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(ENV_BIND_ADDR)
            && !raw.trim().is_empty()
        {
            config.bind_addr = raw.trim().parse()?;
        }
        if let Ok(raw) = std::env::var(ENV_API_KEYS) {
            config.auth = AuthConfig::from_key_list(&raw);
        }
        Ok(config)
    }
}

/// HTTP server over a transfer engine.
pub struct ApiServer {
    config: ServerConfig,
    state: AppState,
}

impl ApiServer {
    /// Creates a server.
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Binds and serves until the process is stopped.
    ///
    /// # Errors
    /// Returns an error if the address cannot be bound or serving fails.
    pub async fn run(self) -> std::io::Result<()> {
        let auth = AuthState::new(self.config.auth);
        if !auth.require_auth() {
            tracing::warn!("No API keys configured, /transfers is unauthenticated");
        }
        let app = router(self.state, auth);

        let listener = TcpListener::bind(self.config.bind_addr).await?;
        info!(addr = %listener.local_addr()?, "API server listening");
        axum::serve(listener, app).await
    }
}
