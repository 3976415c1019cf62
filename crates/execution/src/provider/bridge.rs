//! Indirection between the engine and an injected wallet provider.

use super::{EventListener, ListenerId, ProviderEvent, SessionState, WalletProvider, WalletSession};
use crate::classifier::classify_provider_error;
use solpay_domain::{Address, TransferError};
use solpay_protocols::transfer::UnsignedMessage;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

/// Capacity of the relayed event channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

type ProviderSlot = Option<Arc<dyn WalletProvider>>;

/// Removes a provider listener when dropped.
pub struct EventSubscription {
    provider: Arc<dyn WalletProvider>,
    id: ListenerId,
}

impl EventSubscription {
    /// Listener id on the provider.
    pub fn id(&self) -> ListenerId {
        self.id
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.provider.unsubscribe(self.id);
    }
}

/// Holds the (possibly not yet available) wallet provider.
///
/// Providers are installed at runtime; callers either check
/// [`ProviderBridge::is_available`] or wait for one with
/// [`ProviderBridge::wait_until_available`]. Provider events are applied to
/// the [`WalletSession`] and relayed on a broadcast channel.
pub struct ProviderBridge {
    slot: watch::Sender<ProviderSlot>,
    session: Arc<WalletSession>,
    events: broadcast::Sender<ProviderEvent>,
    relay: Mutex<Option<EventSubscription>>,
}

impl ProviderBridge {
    /// Creates a bridge with no provider installed.
    pub fn new() -> Self {
        let (slot, _) = watch::channel(None);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            slot,
            session: Arc::new(WalletSession::new()),
            events,
            relay: Mutex::new(None),
        }
    }

    /// Creates a bridge with `provider` already installed.
    pub fn with_provider(provider: Arc<dyn WalletProvider>) -> Self {
        let bridge = Self::new();
        bridge.install(provider);
        bridge
    }

    /// Installs (or replaces) the provider.
    ///
    /// Any account from a previous provider is dropped. If the new provider
    /// already has a connected account, the session picks it up without
    /// prompting.
    pub fn install(&self, provider: Arc<dyn WalletProvider>) {
        let session = self.session.clone();
        let events = self.events.clone();
        let relay: EventListener = Arc::new(move |event: &ProviderEvent| {
            session.apply(event);
            // No receivers is fine.
            let _ = events.send(event.clone());
        });
        let subscription = EventSubscription {
            id: provider.subscribe(relay),
            provider: provider.clone(),
        };

        // Dropping the previous relay unsubscribes it from the old provider.
        let previous = self
            .relay
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(subscription);
        drop(previous);

        // An account from the replaced provider must not survive the swap.
        if self.session.address().is_some() {
            self.session.disconnected();
        }
        self.session.set_ready(true);
        if let Some(address) = provider.connected_address() {
            self.session.connected(address);
        }

        self.slot.send_replace(Some(provider));
        info!("Wallet provider installed");
    }

    /// Removes the provider and clears the session.
    pub fn uninstall(&self) {
        self.relay
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.slot.send_replace(None);
        self.session.set_ready(false);
        info!("Wallet provider removed");
    }

    /// Whether a provider is installed.
    pub fn is_available(&self) -> bool {
        self.slot.borrow().is_some()
    }

    /// Waits up to `timeout` for a provider to be installed.
    ///
    /// # Errors
    /// [`TransferError::ProviderUnavailable`] if none appears in time.
    pub async fn wait_until_available(
        &self,
        timeout: Duration,
    ) -> Result<Arc<dyn WalletProvider>, TransferError> {
        let mut rx = self.slot.subscribe();
        let wait = async move {
            match rx.wait_for(Option::is_some).await {
                Ok(slot) => slot.clone(),
                Err(_) => None,
            }
        };

        match tokio::time::timeout(timeout, wait).await {
            Ok(Some(provider)) => Ok(provider),
            Ok(None) | Err(_) => Err(TransferError::ProviderUnavailable(format!(
                "no wallet provider after {}ms",
                timeout.as_millis()
            ))),
        }
    }

    /// Session state view.
    pub fn session(&self) -> SessionState {
        self.session.snapshot()
    }

    /// Connected payer address, if any. Does not call the provider.
    pub fn connected_address(&self) -> Option<Address> {
        self.session.address()
    }

    /// Relayed provider events.
    pub fn events(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }

    /// Registers `listener` directly on the installed provider.
    ///
    /// # Errors
    /// [`TransferError::ProviderUnavailable`] if no provider is installed.
    pub fn subscribe(&self, listener: EventListener) -> Result<EventSubscription, TransferError> {
        let provider = self.provider()?;
        Ok(EventSubscription {
            id: provider.subscribe(listener),
            provider,
        })
    }

    /// Connects the wallet.
    pub async fn connect(&self) -> Result<Address, TransferError> {
        let provider = self.provider()?;
        self.session.begin_connect();

        match provider.connect().await {
            Ok(address) => {
                self.session.connected(address);
                Ok(address)
            }
            Err(err) => {
                warn!(code = ?err.code, error = %err, "Wallet connect failed");
                self.session.failed(err.message.clone());
                Err(classify_provider_error(&err))
            }
        }
    }

    /// Disconnects the wallet.
    pub async fn disconnect(&self) -> Result<(), TransferError> {
        let provider = self.provider()?;
        provider
            .disconnect()
            .await
            .map_err(|err| classify_provider_error(&err))?;
        self.session.disconnected();
        Ok(())
    }

    /// Hands `message` to the wallet and returns the normalized signature.
    ///
    /// # Errors
    /// Provider failures are classified; an empty signature is an
    /// [`TransferError::UnknownTransportError`].
    pub async fn sign_and_send(&self, message: &UnsignedMessage) -> Result<String, TransferError> {
        let provider = self.provider()?;

        let response = provider
            .sign_and_send_transaction(message)
            .await
            .map_err(|err| {
                warn!(code = ?err.code, error = %err, "Wallet sign-and-send failed");
                classify_provider_error(&err)
            })?;

        let signature = response.into_signature();
        if signature.trim().is_empty() {
            return Err(TransferError::UnknownTransportError(
                "wallet returned an empty signature".to_string(),
            ));
        }

        debug!(signature = %signature, "Wallet broadcast transaction");
        Ok(signature)
    }

    fn provider(&self) -> Result<Arc<dyn WalletProvider>, TransferError> {
        self.slot.borrow().clone().ok_or_else(|| {
            TransferError::ProviderUnavailable("no wallet provider installed".to_string())
        })
    }
}

impl Default for ProviderBridge {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ProviderError, SignResponse};
    use crate::provider::scripted::ScriptedProvider;
    use solpay_domain::ErrorKind;

    #[tokio::test]
    async fn test_no_provider_is_unavailable() {
        let bridge = ProviderBridge::new();

        assert!(!bridge.is_available());
        assert_eq!(
            bridge.connect().await.unwrap_err().kind(),
            ErrorKind::ProviderUnavailable
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_available_times_out() {
        let bridge = ProviderBridge::new();

        let result = bridge.wait_until_available(Duration::from_secs(3)).await;

        assert!(matches!(result, Err(TransferError::ProviderUnavailable(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_available_sees_late_install() {
        let bridge = Arc::new(ProviderBridge::new());
        let installer = bridge.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            installer.install(Arc::new(ScriptedProvider::new()));
        });

        let provider = bridge.wait_until_available(Duration::from_secs(3)).await;

        assert!(provider.is_ok());
        assert!(bridge.session().ready);
    }

    #[tokio::test]
    async fn test_install_picks_up_trusted_session() {
        let provider = Arc::new(ScriptedProvider::new().already_connected());
        let bridge = ProviderBridge::with_provider(provider.clone());

        assert_eq!(bridge.connected_address(), Some(provider.address()));
        assert_eq!(provider.connect_calls(), 0);
    }

    #[tokio::test]
    async fn test_replacing_provider_drops_previous_account() {
        let first = Arc::new(ScriptedProvider::new().already_connected());
        let bridge = ProviderBridge::with_provider(first.clone());
        assert_eq!(bridge.connected_address(), Some(first.address()));

        let second = Arc::new(ScriptedProvider::new());
        bridge.install(second.clone());

        assert_eq!(second.connected_address(), None);
        assert_eq!(bridge.connected_address(), None);
        assert!(bridge.session().ready);
        assert_eq!(first.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_replacing_provider_adopts_its_account() {
        let first = Arc::new(ScriptedProvider::new().already_connected());
        let bridge = ProviderBridge::with_provider(first);

        let second = Arc::new(ScriptedProvider::new().already_connected());
        bridge.install(second.clone());

        assert_eq!(bridge.connected_address(), Some(second.address()));
    }

    #[tokio::test]
    async fn test_connect_updates_session() {
        let provider = Arc::new(ScriptedProvider::new());
        let bridge = ProviderBridge::with_provider(provider.clone());

        let address = bridge.connect().await.unwrap();

        assert_eq!(address, provider.address());
        assert_eq!(bridge.connected_address(), Some(address));
    }

    #[tokio::test]
    async fn test_rejected_connect_records_error() {
        let provider =
            Arc::new(ScriptedProvider::new().with_connect_error(ProviderError::user_rejected()));
        let bridge = ProviderBridge::with_provider(provider);

        let err = bridge.connect().await.unwrap_err();

        assert_eq!(err, TransferError::UserRejected);
        let session = bridge.session();
        assert!(!session.connecting);
        assert!(session.last_error.is_some());
    }

    #[tokio::test]
    async fn test_events_update_session_and_relay() {
        let provider = Arc::new(ScriptedProvider::new());
        let bridge = ProviderBridge::with_provider(provider.clone());
        let mut events = bridge.events();
        bridge.connect().await.unwrap();

        provider.emit(ProviderEvent::AccountChanged(None));

        assert_eq!(bridge.connected_address(), None);
        assert_eq!(
            events.recv().await.unwrap(),
            ProviderEvent::AccountChanged(None)
        );
    }

    #[tokio::test]
    async fn test_subscription_disposer_unsubscribes() {
        let provider = Arc::new(ScriptedProvider::new());
        let bridge = ProviderBridge::with_provider(provider.clone());
        assert_eq!(provider.listener_count(), 1);

        let subscription = bridge.subscribe(Arc::new(|_: &ProviderEvent| {})).unwrap();
        assert_eq!(provider.listener_count(), 2);

        drop(subscription);
        assert_eq!(provider.listener_count(), 1);

        bridge.uninstall();
        assert_eq!(provider.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_wrapped_signature_is_normalized() {
        let provider = Arc::new(ScriptedProvider::new().with_sign_results([Ok(
            SignResponse::Wrapped {
                signature: "abc123".to_string(),
            },
        )]));
        let bridge = ProviderBridge::with_provider(provider);

        let signature = bridge
            .sign_and_send(&crate::provider::scripted::sample_message())
            .await
            .unwrap();

        assert_eq!(signature, "abc123");
    }

    #[tokio::test]
    async fn test_empty_signature_is_rejected() {
        let provider = Arc::new(
            ScriptedProvider::new().with_sign_results([Ok(SignResponse::Bare(String::new()))]),
        );
        let bridge = ProviderBridge::with_provider(provider);

        let err = bridge
            .sign_and_send(&crate::provider::scripted::sample_message())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnknownTransportError);
    }
}
