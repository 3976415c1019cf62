//! Submission lifecycle tracking.
//!
//! Tracks each transfer submission through its stages:
//! - Input validation
//! - Endpoint acquisition
//! - Wallet broadcast
//! - Confirmation, timeout or failure

mod events;
mod tracker;

pub use events::*;
pub use tracker::*;
