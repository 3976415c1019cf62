//! Solana JSON-RPC implementation of [`LedgerRpc`].

use super::{LatestBlockhash, LedgerRpc, RpcConnector, RpcError, SignatureState};
use async_trait::async_trait;
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solpay_domain::{Commitment, Endpoint};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Converts the domain commitment into the client configuration.
#[must_use]
pub fn commitment_config(commitment: Commitment) -> CommitmentConfig {
    match commitment {
        Commitment::Processed => CommitmentConfig::processed(),
        Commitment::Confirmed => CommitmentConfig::confirmed(),
        Commitment::Finalized => CommitmentConfig::finalized(),
    }
}

impl From<ClientError> for RpcError {
    fn from(err: ClientError) -> Self {
        match err.kind() {
            ClientErrorKind::Io(_) | ClientErrorKind::Reqwest(_) => Self::Connect(err.to_string()),
            ClientErrorKind::SerdeJson(_) => Self::Malformed(err.to_string()),
            _ => Self::Rpc(err.to_string()),
        }
    }
}

/// RPC handle backed by the nonblocking Solana client.
pub struct SolanaRpc {
    url: String,
    client: RpcClient,
}

impl SolanaRpc {
    /// Creates a handle for `url` with a transport-level request timeout.
    pub fn new(url: impl Into<String>, request_timeout: Duration) -> Self {
        let url = url.into();
        let client = RpcClient::new_with_timeout_and_commitment(
            url.clone(),
            request_timeout,
            CommitmentConfig::confirmed(),
        );
        Self { url, client }
    }

    /// Gives access to the underlying client.
    pub fn client(&self) -> &RpcClient {
        &self.client
    }
}

#[async_trait]
impl LedgerRpc for SolanaRpc {
    fn url(&self) -> &str {
        &self.url
    }

    async fn latest_blockhash(&self, commitment: Commitment) -> Result<LatestBlockhash, RpcError> {
        let (blockhash, last_valid_block_height) = self
            .client
            .get_latest_blockhash_with_commitment(commitment_config(commitment))
            .await?;

        Ok(LatestBlockhash {
            blockhash,
            last_valid_block_height,
        })
    }

    async fn block_height(&self, commitment: Commitment) -> Result<u64, RpcError> {
        Ok(self
            .client
            .get_block_height_with_commitment(commitment_config(commitment))
            .await?)
    }

    async fn signature_state(
        &self,
        signature: &str,
        commitment: Commitment,
    ) -> Result<SignatureState, RpcError> {
        let signature = Signature::from_str(signature)
            .map_err(|e| RpcError::Malformed(format!("signature {signature:?}: {e}")))?;

        let statuses = self.client.get_signature_statuses(&[signature]).await?.value;

        let state = match statuses.into_iter().next().flatten() {
            None => SignatureState::NotFound,
            Some(status) => match status.err {
                Some(err) => SignatureState::Failed(err.to_string()),
                None if status.satisfies_commitment(commitment_config(commitment)) => {
                    SignatureState::Succeeded
                }
                None => SignatureState::Processing,
            },
        };

        debug!(url = %self.url, signature = %signature, state = ?state, "Signature status");
        Ok(state)
    }

    async fn balance(&self, address: &Pubkey) -> Result<u64, RpcError> {
        Ok(self.client.get_balance(address).await?)
    }
}

/// Opens [`SolanaRpc`] handles over HTTP(S).
#[derive(Debug, Clone)]
pub struct SolanaConnector {
    request_timeout: Duration,
}

impl SolanaConnector {
    /// Creates a connector whose handles use `request_timeout` per request.
    pub fn new(request_timeout: Duration) -> Self {
        Self { request_timeout }
    }
}

impl Default for SolanaConnector {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl RpcConnector for SolanaConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Arc<dyn LedgerRpc>, RpcError> {
        if !(endpoint.url.starts_with("http://") || endpoint.url.starts_with("https://")) {
            return Err(RpcError::Connect(format!(
                "unsupported endpoint scheme: {}",
                endpoint.url
            )));
        }

        Ok(Arc::new(SolanaRpc::new(
            endpoint.url.clone(),
            self.request_timeout,
        )))
    }
}
