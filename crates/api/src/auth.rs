//! API key authentication.
//!
//! Requests carry their key in the `X-API-Key` header. When no keys are
//! configured the guard lets every request through.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Authentication configuration.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// Valid API keys.
    pub api_keys: HashSet<String>,
}

impl AuthConfig {
    /// Builds a configuration from a comma-separated key list.
    pub fn from_key_list(raw: &str) -> Self {
        Self {
            api_keys: raw
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Authentication state shared across handlers.
#[derive(Clone, Default)]
pub struct AuthState {
    config: Arc<AuthConfig>,
}

impl AuthState {
    /// Creates a new authentication state.
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Validates an API key.
    #[must_use]
    pub fn validate_api_key(&self, key: &str) -> bool {
        self.config.api_keys.contains(key)
    }

    /// Checks if authentication is required.
    #[must_use]
    pub fn require_auth(&self) -> bool {
        !self.config.api_keys.is_empty()
    }
}

/// Authentication errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    /// Missing authentication header.
    #[error("Missing API key")]
    MissingAuth,
    /// Invalid API key.
    #[error("Invalid API key")]
    InvalidApiKey,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let kind = match &self {
            Self::MissingAuth => "missing_auth",
            Self::InvalidApiKey => "invalid_api_key",
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "kind": kind,
            "message": self.to_string(),
        });

        (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
    }
}

/// Extracts the API key from request headers.
pub fn extract_api_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
}

/// Rejects requests without a valid API key when keys are configured.
pub async fn require_api_key(
    State(auth): State<AuthState>,
    headers: HeaderMap,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    if !auth.require_auth() {
        return Ok(next.run(request).await);
    }

    match extract_api_key(&headers) {
        Some(key) if auth.validate_api_key(key) => {
            debug!("API key authentication");
            Ok(next.run(request).await)
        }
        Some(_) => {
            warn!(path = %request.uri().path(), "Invalid API key");
            Err(AuthError::InvalidApiKey)
        }
        None => {
            warn!(path = %request.uri().path(), "Missing API key");
            Err(AuthError::MissingAuth)
        }
    }
}
