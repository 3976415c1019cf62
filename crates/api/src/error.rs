//! API error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use solpay_domain::{ErrorKind, TransferError};

/// JSON error body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    /// Technical description.
    pub error: String,
    /// Stable error code.
    pub kind: String,
    /// Message suitable for end users.
    pub message: String,
}

/// Errors returned by API handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Transfer engine failure.
    #[error(transparent)]
    Transfer(#[from] TransferError),
    /// Malformed request.
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Transfer(err) => match err.kind() {
                ErrorKind::InvalidRecipient | ErrorKind::InvalidAmount => StatusCode::BAD_REQUEST,
                ErrorKind::NetworkUnavailable | ErrorKind::ProviderUnavailable => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                ErrorKind::UserRejected => StatusCode::FORBIDDEN,
                ErrorKind::InsufficientFunds => StatusCode::PAYMENT_REQUIRED,
                ErrorKind::BlockhashExpired => StatusCode::CONFLICT,
                ErrorKind::FailedOnChain => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorKind::TimedOutUnconfirmed => StatusCode::ACCEPTED,
                ErrorKind::UnknownTransportError => StatusCode::BAD_GATEWAY,
                ErrorKind::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            Self::Transfer(err) => ErrorBody {
                error: err.to_string(),
                kind: err.kind().as_str().to_string(),
                message: err.user_message(),
            },
            Self::BadRequest(reason) => ErrorBody {
                error: self.to_string(),
                kind: "bad_request".to_string(),
                message: reason.clone(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
