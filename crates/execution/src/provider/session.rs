//! Observable wallet session state.

use super::ProviderEvent;
use serde::Serialize;
use solpay_domain::Address;
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info};

/// Point-in-time view of the wallet session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    /// A provider is installed.
    pub ready: bool,
    /// A connect request is in flight.
    pub connecting: bool,
    /// Connected account, if any.
    pub address: Option<Address>,
    /// Last connect or session error.
    pub last_error: Option<String>,
}

impl SessionState {
    /// Whether an account is connected.
    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }
}

/// Session state updated from provider events and connect results.
#[derive(Debug, Default)]
pub struct WalletSession {
    state: RwLock<SessionState>,
}

impl WalletSession {
    /// Creates an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn snapshot(&self) -> SessionState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Connected account, if any.
    pub fn address(&self) -> Option<Address> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .address
    }

    /// Marks whether a provider is installed.
    pub fn set_ready(&self, ready: bool) {
        self.update(|state| {
            state.ready = ready;
            if !ready {
                state.address = None;
                state.connecting = false;
            }
        });
    }

    /// Marks the start of a connect request.
    pub fn begin_connect(&self) {
        self.update(|state| {
            state.connecting = true;
            state.last_error = None;
        });
    }

    /// Records a successful connect.
    pub fn connected(&self, address: Address) {
        info!(address = %address, "Wallet connected");
        self.update(|state| {
            state.connecting = false;
            state.address = Some(address);
            state.last_error = None;
        });
    }

    /// Records a failed connect.
    pub fn failed(&self, error: impl Into<String>) {
        self.update(|state| {
            state.connecting = false;
            state.last_error = Some(error.into());
        });
    }

    /// Records a disconnect.
    pub fn disconnected(&self) {
        info!("Wallet disconnected");
        self.update(|state| {
            state.connecting = false;
            state.address = None;
        });
    }

    /// Applies a provider event.
    pub fn apply(&self, event: &ProviderEvent) {
        debug!(event = ?event, "Wallet event");
        match event {
            ProviderEvent::Connect(Some(address)) => self.connected(*address),
            // Connect without an address leaves the current account in place.
            ProviderEvent::Connect(None) => self.update(|state| state.connecting = false),
            ProviderEvent::Disconnect | ProviderEvent::AccountChanged(None) => self.disconnected(),
            ProviderEvent::AccountChanged(Some(address)) => {
                info!(address = %address, "Wallet account changed");
                self.update(|state| state.address = Some(*address));
            }
        }
    }

    fn update(&self, f: impl FnOnce(&mut SessionState)) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut state);
    }
}
