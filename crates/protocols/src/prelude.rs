//! Prelude module for convenient imports.
//!
//! # Example
//!
//! ```rust
//! use solpay_protocols::prelude::*;
//! ```

pub use crate::endpoint_pool::{BlockhashLease, EndpointPool, LiveConnection, ProbeReport};
pub use crate::rpc::{
    LatestBlockhash, LedgerRpc, RpcConnector, RpcError, SignatureState, SolanaConnector, SolanaRpc,
};
pub use crate::transfer::{SYSTEM_PROGRAM_ID, TransferBuilder, UnsignedMessage};
