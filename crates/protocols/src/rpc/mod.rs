//! Ledger RPC access.
//!
//! The engine talks to endpoints only through [`LedgerRpc`] handles opened
//! by an [`RpcConnector`], so endpoint failover and confirmation polling
//! can run against any transport.

#[cfg(any(test, feature = "test-utils"))]
pub mod scripted;
pub mod solana;

use async_trait::async_trait;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solpay_domain::{Commitment, Endpoint, FailureReason};
use std::sync::Arc;
use std::time::Duration;

pub use solana::{SolanaConnector, SolanaRpc};

/// Errors raised by a single RPC call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RpcError {
    /// No response within the allowed time.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    /// The transport could not reach the endpoint.
    #[error("connection failed: {0}")]
    Connect(String),
    /// The endpoint returned an error response.
    #[error("rpc error: {0}")]
    Rpc(String),
    /// The response could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl RpcError {
    /// Maps the error onto the diagnostic reason recorded by the pool.
    #[must_use]
    pub fn failure_reason(&self) -> FailureReason {
        match self {
            Self::Timeout(_) => FailureReason::Timeout,
            Self::Connect(_) => FailureReason::Connect,
            Self::Rpc(_) => FailureReason::Rpc,
            Self::Malformed(_) => FailureReason::Malformed,
        }
    }
}

/// Latest blockhash together with the last block height at which it is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatestBlockhash {
    /// Recent blockhash.
    pub blockhash: Hash,
    /// Last block height at which a transaction using it can land.
    pub last_valid_block_height: u64,
}

/// Status of a broadcast signature as seen by one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureState {
    /// The endpoint does not know the signature (yet).
    NotFound,
    /// Seen, but not at the requested commitment.
    Processing,
    /// Landed without error at the requested commitment.
    Succeeded,
    /// Landed and the ledger reported an execution error.
    Failed(String),
}

/// An open handle to one RPC endpoint.
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// URL this handle talks to.
    fn url(&self) -> &str;

    /// Fetches the latest blockhash and its expiry height.
    async fn latest_blockhash(&self, commitment: Commitment) -> Result<LatestBlockhash, RpcError>;

    /// Fetches the current block height.
    async fn block_height(&self, commitment: Commitment) -> Result<u64, RpcError>;

    /// Looks up the status of a broadcast signature.
    async fn signature_state(
        &self,
        signature: &str,
        commitment: Commitment,
    ) -> Result<SignatureState, RpcError>;

    /// Fetches the balance of an account in lamports.
    async fn balance(&self, address: &Pubkey) -> Result<u64, RpcError>;
}

/// Opens transport handles for configured endpoints.
#[async_trait]
pub trait RpcConnector: Send + Sync {
    /// Opens a handle for `endpoint`.
    async fn connect(&self, endpoint: &Endpoint) -> Result<Arc<dyn LedgerRpc>, RpcError>;
}
