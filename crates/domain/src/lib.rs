//! Core types for SOL transfer submission.
//!
//! This crate holds the value objects and entities shared by the engine:
//! - Validated ledger addresses
//! - Minor-unit amounts and unit scales
//! - RPC endpoint configuration
//! - Transfer requests, receipts and confirmation outcomes
//! - The closed transfer error taxonomy

pub mod entities;
pub mod enums;
pub mod errors;
pub mod value_objects;

pub use entities::{Endpoint, EndpointFailure, FailureReason, TransferReceipt, TransferRequest};
pub use enums::{Commitment, ConfirmationOutcome};
pub use errors::{ErrorKind, TransferError};
pub use value_objects::{Address, MinorUnits, UnitScale};
