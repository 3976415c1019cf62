//! Maps raw wallet and transport failures onto [`TransferError`].
//!
//! Wallet RPC codes are checked first, then well-known message fragments.
//! Anything unmatched becomes [`TransferError::UnknownTransportError`] and
//! its raw cause is logged at error level.

use crate::provider::ProviderError;
use solpay_domain::TransferError;
use solpay_protocols::rpc::RpcError;
use tracing::error;

/// User rejected the request.
pub const CODE_USER_REJECTED: i64 = 4001;
/// Method or account not authorized.
pub const CODE_UNAUTHORIZED: i64 = 4100;
/// Provider disconnected from all chains.
pub const CODE_DISCONNECTED: i64 = 4900;
/// A request of the same kind is already pending.
pub const CODE_REQUEST_PENDING: i64 = -32002;
/// Internal provider error; the message carries the detail.
pub const CODE_INTERNAL: i64 = -32603;

const REJECTED_FRAGMENTS: &[&str] = &[
    "user rejected",
    "rejected the request",
    "user denied",
    "user cancelled",
    "user canceled",
];

const INSUFFICIENT_FRAGMENTS: &[&str] = &[
    "insufficient funds",
    "insufficient lamports",
    "insufficient balance",
    "no record of a prior credit",
];

const EXPIRED_FRAGMENTS: &[&str] = &[
    "blockhash not found",
    "block height exceeded",
    "blockhash expired",
    "transaction expired",
];

const UNAVAILABLE_FRAGMENTS: &[&str] = &[
    "wallet not connected",
    "not connected",
    "wallet not found",
    "provider not found",
    "no provider",
];

/// Classifies a wallet provider failure.
pub fn classify_provider_error(err: &ProviderError) -> TransferError {
    match err.code {
        Some(CODE_USER_REJECTED) => TransferError::UserRejected,
        Some(CODE_UNAUTHORIZED | CODE_DISCONNECTED) => {
            TransferError::ProviderUnavailable(err.message.clone())
        }
        Some(CODE_REQUEST_PENDING) => TransferError::ProviderUnavailable(format!(
            "a wallet request is already pending: {}",
            err.message
        )),
        // -32603 and unknown codes fall through to the message.
        _ => classify_message(&err.message),
    }
}

/// Classifies a transport failure outside endpoint acquisition.
pub fn classify_rpc_error(err: &RpcError) -> TransferError {
    match err {
        RpcError::Rpc(message) => classify_message(message),
        other => unknown(&other.to_string()),
    }
}

/// Classifies a bare failure message.
pub fn classify_message(message: &str) -> TransferError {
    match match_fragments(message) {
        Some(classified) => classified,
        None => unknown(message),
    }
}

fn match_fragments(message: &str) -> Option<TransferError> {
    let lower = message.to_lowercase();
    let contains_any = |fragments: &[&str]| fragments.iter().any(|f| lower.contains(f));

    if contains_any(REJECTED_FRAGMENTS) {
        Some(TransferError::UserRejected)
    } else if contains_any(INSUFFICIENT_FRAGMENTS) {
        Some(TransferError::InsufficientFunds(message.to_string()))
    } else if contains_any(EXPIRED_FRAGMENTS) {
        Some(TransferError::BlockhashExpired(message.to_string()))
    } else if contains_any(UNAVAILABLE_FRAGMENTS) {
        Some(TransferError::ProviderUnavailable(message.to_string()))
    } else {
        None
    }
}

fn unknown(cause: &str) -> TransferError {
    error!(cause = %cause, "Unclassified transfer failure");
    TransferError::UnknownTransportError(cause.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use solpay_domain::ErrorKind;
    use std::time::Duration;

    #[test]
    fn test_user_rejected_by_code() {
        let err = ProviderError::with_code(4001, "whatever the wallet says");
        assert_eq!(classify_provider_error(&err), TransferError::UserRejected);
    }

    #[test]
    fn test_user_rejected_by_message() {
        let err = ProviderError::new("User rejected the request.");
        assert_eq!(classify_provider_error(&err), TransferError::UserRejected);
    }

    #[test]
    fn test_session_codes_mean_unavailable() {
        for code in [4100, 4900, -32002] {
            let err = ProviderError::with_code(code, "nope");
            assert_eq!(
                classify_provider_error(&err).kind(),
                ErrorKind::ProviderUnavailable,
                "code {code}"
            );
        }
    }

    #[test]
    fn test_internal_error_uses_message() {
        let err = ProviderError::with_code(
            -32603,
            "Transaction simulation failed: Attempt to debit an account but found no record of a prior credit.",
        );
        assert_eq!(
            classify_provider_error(&err).kind(),
            ErrorKind::InsufficientFunds
        );
    }

    #[test]
    fn test_message_fragments() {
        let cases = [
            ("Transfer: insufficient lamports 5000, need 10005000", ErrorKind::InsufficientFunds),
            ("Blockhash not found", ErrorKind::BlockhashExpired),
            ("block height exceeded", ErrorKind::BlockhashExpired),
            ("Wallet not connected", ErrorKind::ProviderUnavailable),
            ("socket hang up", ErrorKind::UnknownTransportError),
        ];
        for (message, kind) in cases {
            assert_eq!(classify_message(message).kind(), kind, "{message}");
        }
    }

    #[test]
    fn test_unknown_keeps_raw_cause() {
        assert_eq!(
            classify_message("socket hang up"),
            TransferError::UnknownTransportError("socket hang up".to_string())
        );
    }

    #[test]
    fn test_rpc_errors() {
        assert_eq!(
            classify_rpc_error(&RpcError::Rpc("Blockhash not found".to_string())).kind(),
            ErrorKind::BlockhashExpired
        );
        assert_eq!(
            classify_rpc_error(&RpcError::Timeout(Duration::from_secs(1))).kind(),
            ErrorKind::UnknownTransportError
        );
    }
}
