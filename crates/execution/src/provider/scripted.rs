//! Scripted wallet provider used by tests across the workspace.

use super::{
    EventListener, ListenerId, ListenerSet, ProviderError, ProviderEvent, SignResponse,
    WalletProvider,
};
use async_trait::async_trait;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solpay_domain::{Address, MinorUnits, TransferRequest};
use solpay_protocols::endpoint_pool::BlockhashLease;
use solpay_protocols::transfer::{TransferBuilder, UnsignedMessage};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// A [`WalletProvider`] that replays scripted answers.
///
/// Sign requests without a queued answer succeed with a signature derived
/// from the call number.
pub struct ScriptedProvider {
    address: Address,
    connected: AtomicBool,
    connect_error: Option<ProviderError>,
    sign_results: Mutex<VecDeque<Result<SignResponse, ProviderError>>>,
    signed: Mutex<Vec<UnsignedMessage>>,
    connect_calls: AtomicUsize,
    listeners: ListenerSet,
}

impl ScriptedProvider {
    /// Creates a disconnected provider with a fresh address.
    pub fn new() -> Self {
        Self {
            address: Address::from_pubkey(Pubkey::new_unique()),
            connected: AtomicBool::new(false),
            connect_error: None,
            sign_results: Mutex::new(VecDeque::new()),
            signed: Mutex::new(Vec::new()),
            connect_calls: AtomicUsize::new(0),
            listeners: ListenerSet::new(),
        }
    }

    /// Starts connected, as a trusted wallet would.
    #[must_use]
    pub fn already_connected(self) -> Self {
        self.connected.store(true, Ordering::SeqCst);
        self
    }

    /// Makes `connect` fail with `error`.
    #[must_use]
    pub fn with_connect_error(mut self, error: ProviderError) -> Self {
        self.connect_error = Some(error);
        self
    }

    /// Queues sign-and-send answers.
    #[must_use]
    pub fn with_sign_results(
        self,
        results: impl IntoIterator<Item = Result<SignResponse, ProviderError>>,
    ) -> Self {
        self.sign_results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(results);
        self
    }

    /// The wallet's address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Number of `connect` calls.
    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    /// Messages handed to sign-and-send, in order.
    pub fn signed_messages(&self) -> Vec<UnsignedMessage> {
        self.signed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of sign-and-send calls.
    pub fn sign_calls(&self) -> usize {
        self.signed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Emits `event` to every listener.
    pub fn emit(&self, event: ProviderEvent) {
        self.listeners.emit(&event);
    }
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WalletProvider for ScriptedProvider {
    async fn connect(&self) -> Result<Address, ProviderError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.connect_error {
            return Err(err.clone());
        }
        self.connected.store(true, Ordering::SeqCst);
        self.listeners
            .emit(&ProviderEvent::Connect(Some(self.address)));
        Ok(self.address)
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
        let call = {
            let mut signed = self.signed.lock().unwrap_or_else(PoisonError::into_inner);
            signed.push(message.clone());
            signed.len()
        };
        self.sign_results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Ok(SignResponse::Bare(format!("sig{call}"))))
    }

    fn connected_address(&self) -> Option<Address> {
        self.connected
            .load(Ordering::SeqCst)
            .then_some(self.address)
    }

    fn subscribe(&self, listener: EventListener) -> ListenerId {
        self.listeners.add(listener)
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.listeners.remove(id);
    }
}

/// A valid unsigned transfer message for tests that only need one to exist.
pub fn sample_message() -> UnsignedMessage {
    let request = TransferRequest {
        payer: Address::from_pubkey(Pubkey::new_unique()),
        recipient: Address::from_pubkey(Pubkey::new_unique()),
        amount: MinorUnits::new(1),
    };
    let lease = BlockhashLease {
        blockhash: Hash::new_from_array([1; 32]),
        last_valid_block_height: 1_150,
        observed_block_height: 1_000,
    };

    match TransferBuilder::new().build_with_lease(&request, &lease) {
        Ok(message) => message,
        Err(err) => panic!("sample message failed to build: {err}"),
    }
}
