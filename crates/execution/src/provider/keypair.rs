//! Wallet provider backed by a local keypair.

use super::{
    EventListener, ListenerId, ListenerSet, ProviderError, ProviderEvent, SignResponse,
    WalletProvider,
};
use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::transaction::VersionedTransaction;
use solpay_domain::{Address, Commitment};
use solpay_protocols::rpc::RpcError;
use solpay_protocols::rpc::solana::commitment_config;
use solpay_protocols::transfer::UnsignedMessage;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};
use zeroize::Zeroizing;

/// Signs with an in-process keypair and broadcasts through its own RPCs.
///
/// Used by the CLI and the HTTP service, where no browser wallet exists.
/// Broadcast tries each RPC in order and moves on only when the endpoint
/// cannot be reached; a node that answers with an error ends the attempt.
/// Preflight runs at the same commitment the blockhash was fetched with.
pub struct KeypairProvider {
    keypair: Keypair,
    rpcs: Vec<RpcClient>,
    connected: AtomicBool,
    listeners: ListenerSet,
}

impl KeypairProvider {
    /// Loads a keypair from its base58-encoded 64-byte secret.
    ///
    /// # Errors
    /// Returns an error if the secret is not valid base58 or not a keypair.
    pub fn from_base58<I, S>(
        secret: &str,
        rpc_urls: I,
        commitment: Commitment,
    ) -> Result<Self, ProviderError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let bytes = Zeroizing::new(
            bs58::decode(secret.trim())
                .into_vec()
                .map_err(|e| ProviderError::new(format!("signer secret is not base58: {e}")))?,
        );
        let keypair = Keypair::try_from(bytes.as_slice())
            .map_err(|e| ProviderError::new(format!("invalid signer keypair: {e}")))?;

        Ok(Self::new(keypair, rpc_urls, commitment))
    }

    /// Wraps an existing keypair.
    pub fn new<I, S>(keypair: Keypair, rpc_urls: I, commitment: Commitment) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rpcs = rpc_urls
            .into_iter()
            .map(|url| {
                RpcClient::new_with_commitment(url.into(), commitment_config(commitment))
            })
            .collect();
        Self {
            keypair,
            rpcs,
            connected: AtomicBool::new(false),
            listeners: ListenerSet::new(),
        }
    }

    /// The signer's address.
    pub fn address(&self) -> Address {
        Address::from_pubkey(self.keypair.pubkey())
    }

    /// Broadcast RPC URLs, in the order they are tried.
    pub fn rpc_urls(&self) -> Vec<String> {
        self.rpcs.iter().map(RpcClient::url).collect()
    }

    async fn broadcast(&self, transaction: &VersionedTransaction) -> Result<String, ProviderError> {
        let mut last_failure = None;

        for rpc in &self.rpcs {
            match rpc.send_transaction(transaction).await {
                Ok(signature) => return Ok(signature.to_string()),
                Err(e) => {
                    let message = e.to_string();
                    warn!(rpc = %rpc.url(), error = %message, "Broadcast failed");
                    if !matches!(RpcError::from(e), RpcError::Connect(_)) {
                        return Err(ProviderError::with_code(-32603, message));
                    }
                    last_failure = Some(format!("{}: {message}", rpc.url()));
                }
            }
        }

        Err(ProviderError::with_code(
            -32603,
            match last_failure {
                Some(failure) => format!("no signer RPC reachable, last error {failure}"),
                None => "no signer RPC configured".to_string(),
            },
        ))
    }
}

#[async_trait]
impl WalletProvider for KeypairProvider {
    async fn connect(&self) -> Result<Address, ProviderError> {
        let address = self.address();
        self.connected.store(true, Ordering::SeqCst);
        info!(address = %address, "Keypair signer connected");
        self.listeners.emit(&ProviderEvent::Connect(Some(address)));
        Ok(address)
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        self.connected.store(false, Ordering::SeqCst);
        self.listeners.emit(&ProviderEvent::Disconnect);
        Ok(())
    }

    async fn sign_and_send_transaction(
        &self,
        message: &UnsignedMessage,
    ) -> Result<SignResponse, ProviderError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(ProviderError::with_code(4100, "Wallet not connected"));
        }

        let transaction = VersionedTransaction::try_new(message.message().clone(), &[&self.keypair])
            .map_err(|e| ProviderError::new(format!("signing failed: {e}")))?;

        let signature = self.broadcast(&transaction).await?;
        Ok(SignResponse::Bare(signature))
    }

    fn connected_address(&self) -> Option<Address> {
        self.connected
            .load(Ordering::SeqCst)
            .then(|| self.address())
    }

    fn subscribe(&self, listener: EventListener) -> ListenerId {
        self.listeners.add(listener)
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.listeners.remove(id);
    }
}
