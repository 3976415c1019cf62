//! Transfer submission engine.
//!
//! This crate provides:
//! - The wallet provider contract, bridge and session view
//! - A local keypair provider for headless signing
//! - Bounded confirmation polling
//! - Failure classification into the transfer error taxonomy
//! - Submission lifecycle tracking
//! - Engine configuration and the end-to-end [`engine::TransferEngine`]

/// Prelude module for convenient imports.
pub mod prelude;

/// Failure classification.
pub mod classifier;
/// Engine configuration.
pub mod config;
/// Confirmation polling.
pub mod confirmation;
/// End-to-end transfer submission.
pub mod engine;
/// Submission lifecycle tracking.
pub mod lifecycle;
/// Wallet provider capability.
pub mod provider;
