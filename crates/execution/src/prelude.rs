//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use solpay_execution::prelude::*;
//! ```

// Classifier
pub use crate::classifier::{classify_message, classify_provider_error, classify_rpc_error};

// Config
pub use crate::config::{ConfigError, DEFAULT_RPC_ENDPOINTS, EngineConfig};

// Confirmation
pub use crate::confirmation::{ConfirmationPoller, PollConfig};

// Engine
pub use crate::engine::TransferEngine;

// Lifecycle
pub use crate::lifecycle::{
    AggregateStats, EventData, SubmissionEvent, SubmissionEventType, SubmissionStatus,
    SubmissionSummary, SubmissionTracker,
};

// Provider
pub use crate::provider::{
    EventListener, EventSubscription, KeypairProvider, ListenerId, ListenerSet, ProviderBridge,
    ProviderError, ProviderEvent, SessionState, SignResponse, WalletProvider, WalletSession,
};
