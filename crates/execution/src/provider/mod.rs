//! Wallet provider capability.
//!
//! A wallet provider holds the payer's keys: it connects, signs and
//! broadcasts messages, and emits session events. The engine never talks
//! to a provider directly; it goes through [`ProviderBridge`], which owns
//! the availability slot and the session view.

mod bridge;
mod keypair;
mod session;

#[cfg(any(test, feature = "test-utils"))]
pub mod scripted;

pub use bridge::{EventSubscription, ProviderBridge};
pub use keypair::KeypairProvider;
pub use session::{SessionState, WalletSession};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use solpay_domain::Address;
use solpay_protocols::transfer::UnsignedMessage;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Error reported by a wallet provider.
///
/// `code` follows the wallet RPC conventions (4001 user rejected, 4100
/// unauthorized, 4900 disconnected, -32002 request pending, -32603 internal).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ProviderError {
    /// Numeric error code, when the provider supplies one.
    pub code: Option<i64>,
    /// Raw provider message.
    pub message: String,
}

impl ProviderError {
    /// An error without a code.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// An error with a wallet RPC code.
    pub fn with_code(code: i64, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }

    /// The error a wallet returns when the user closes the prompt.
    pub fn user_rejected() -> Self {
        Self::with_code(4001, "User rejected the request.")
    }
}

/// Answer to a sign-and-send request.
///
/// Providers return either the bare signature or an object wrapping it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignResponse {
    /// `"5VERv8..."`
    Bare(String),
    /// `{ "signature": "5VERv8..." }`
    Wrapped { signature: String },
}

impl SignResponse {
    /// The signature string, whichever shape it arrived in.
    pub fn into_signature(self) -> String {
        match self {
            Self::Bare(signature) | Self::Wrapped { signature } => signature,
        }
    }
}

/// Session event emitted by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// The wallet connected, optionally reporting its address.
    Connect(Option<Address>),
    /// The wallet disconnected.
    Disconnect,
    /// The active account changed; `None` means the wallet is locked.
    AccountChanged(Option<Address>),
}

/// Callback invoked for every provider event.
pub type EventListener = Arc<dyn Fn(&ProviderEvent) + Send + Sync>;

/// Handle identifying a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Signing and broadcasting capability supplied by the wallet.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Asks the wallet to connect and returns the payer address.
    async fn connect(&self) -> Result<Address, ProviderError>;

    /// Ends the wallet session.
    async fn disconnect(&self) -> Result<(), ProviderError>;

    /// Signs `message` with the connected account and broadcasts it.
    async fn sign_and_send_transaction(
        &self,
        message: &UnsignedMessage,
    ) -> Result<SignResponse, ProviderError>;

    /// Address of an already-connected account, if any.
    fn connected_address(&self) -> Option<Address>;

    /// Registers an event listener.
    fn subscribe(&self, listener: EventListener) -> ListenerId;

    /// Removes a listener registered with [`WalletProvider::subscribe`].
    fn unsubscribe(&self, id: ListenerId);
}

/// Listener registry shared by provider implementations.
#[derive(Default)]
pub struct ListenerSet {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, EventListener)>>,
}

impl ListenerSet {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener.
    pub fn add(&self, listener: EventListener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));
        id
    }

    /// Removes a listener; unknown ids are ignored.
    pub fn remove(&self, id: ListenerId) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(registered, _)| *registered != id);
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delivers `event` to every listener.
    pub fn emit(&self, event: &ProviderEvent) {
        // Snapshot so listeners may (un)subscribe while being called.
        let listeners: Vec<EventListener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        for listener in listeners {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_sign_response_shapes() {
        let bare: SignResponse = serde_json::from_str(r#""abc123""#).unwrap();
        let wrapped: SignResponse = serde_json::from_str(r#"{"signature":"abc123"}"#).unwrap();

        assert_eq!(bare.into_signature(), "abc123");
        assert_eq!(wrapped.into_signature(), "abc123");
    }

    #[test]
    fn test_listener_set_add_emit_remove() {
        let set = ListenerSet::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let id = set.add(Arc::new(move |_: &ProviderEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        set.emit(&ProviderEvent::Disconnect);
        set.remove(id);
        set.emit(&ProviderEvent::Disconnect);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(set.is_empty());
    }

    #[test]
    fn test_user_rejected_code() {
        let err = ProviderError::user_rejected();
        assert_eq!(err.code, Some(4001));
        assert_eq!(err.to_string(), "User rejected the request.");
    }
}
