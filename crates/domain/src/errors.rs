//! Closed error taxonomy for transfer submission.

use crate::entities::EndpointFailure;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every way a transfer submission can end other than plain success.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    /// The recipient (or payer) address failed validation.
    #[error("invalid recipient address {address:?}: {reason}")]
    InvalidRecipient { address: String, reason: String },
    /// The amount is not a positive, representable number of minor units.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    /// Every configured endpoint failed.
    #[error("all {} RPC endpoints failed", .failures.len())]
    NetworkUnavailable { failures: Vec<EndpointFailure> },
    /// No wallet provider is available, or it is not connected.
    #[error("wallet provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// The user declined the wallet prompt.
    #[error("request rejected by user")]
    UserRejected,
    /// The payer cannot cover amount plus fees.
    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),
    /// The recent blockhash is no longer valid.
    #[error("blockhash expired: {0}")]
    BlockhashExpired(String),
    /// The ledger executed the transaction and reported an error.
    #[error("transaction {signature} failed on chain: {payload}")]
    FailedOnChain { signature: String, payload: String },
    /// Broadcast succeeded but confirmation was not observed in time.
    #[error("transaction {signature} not confirmed after {attempts} attempts")]
    TimedOutUnconfirmed { signature: String, attempts: u32 },
    /// Anything the classifier could not place.
    #[error("unknown transport error: {0}")]
    UnknownTransportError(String),
    /// Missing or invalid engine configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Stable machine-readable discriminant of [`TransferError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidRecipient,
    InvalidAmount,
    NetworkUnavailable,
    ProviderUnavailable,
    UserRejected,
    InsufficientFunds,
    BlockhashExpired,
    FailedOnChain,
    TimedOutUnconfirmed,
    UnknownTransportError,
    Configuration,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRecipient => "invalid_recipient",
            Self::InvalidAmount => "invalid_amount",
            Self::NetworkUnavailable => "network_unavailable",
            Self::ProviderUnavailable => "provider_unavailable",
            Self::UserRejected => "user_rejected",
            Self::InsufficientFunds => "insufficient_funds",
            Self::BlockhashExpired => "blockhash_expired",
            Self::FailedOnChain => "failed_on_chain",
            Self::TimedOutUnconfirmed => "timed_out_unconfirmed",
            Self::UnknownTransportError => "unknown_transport_error",
            Self::Configuration => "configuration",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TransferError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRecipient { .. } => ErrorKind::InvalidRecipient,
            Self::InvalidAmount(_) => ErrorKind::InvalidAmount,
            Self::NetworkUnavailable { .. } => ErrorKind::NetworkUnavailable,
            Self::ProviderUnavailable(_) => ErrorKind::ProviderUnavailable,
            Self::UserRejected => ErrorKind::UserRejected,
            Self::InsufficientFunds(_) => ErrorKind::InsufficientFunds,
            Self::BlockhashExpired(_) => ErrorKind::BlockhashExpired,
            Self::FailedOnChain { .. } => ErrorKind::FailedOnChain,
            Self::TimedOutUnconfirmed { .. } => ErrorKind::TimedOutUnconfirmed,
            Self::UnknownTransportError(_) => ErrorKind::UnknownTransportError,
            Self::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// Whether the failure happened before anything reached the ledger.
    pub fn is_pre_broadcast(&self) -> bool {
        !matches!(
            self,
            Self::FailedOnChain { .. } | Self::TimedOutUnconfirmed { .. }
        )
    }

    /// Message suitable for showing to the end user.
    ///
    /// Only [`TransferError::UnknownTransportError`] gets the generic
    /// "try again" text.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidRecipient { .. } => "Invalid recipient address".to_string(),
            Self::InvalidAmount(reason) => format!("Invalid amount: {reason}"),
            Self::NetworkUnavailable { .. } => "Unable to connect to Solana network. All RPC \
                 endpoints failed. Please check your internet connection."
                .to_string(),
            Self::ProviderUnavailable(_) => {
                "Wallet not available. Install or unlock your wallet and connect it.".to_string()
            }
            Self::UserRejected => "Transaction cancelled by user".to_string(),
            Self::InsufficientFunds(_) => {
                "Insufficient SOL balance for this transaction".to_string()
            }
            Self::BlockhashExpired(_) => {
                "The transaction expired before it was sent. Submit it again.".to_string()
            }
            Self::FailedOnChain { payload, .. } => format!("Transaction failed: {payload}"),
            Self::TimedOutUnconfirmed { signature, .. } => format!(
                "Transaction {signature} was sent but its confirmation could not be observed yet"
            ),
            Self::UnknownTransportError(_) => "Something went wrong. Please try again.".to_string(),
            Self::Configuration(reason) => format!("Service misconfigured: {reason}"),
        }
    }
}
