//! Ledger protocol plumbing.
//!
//! This crate provides:
//! - The RPC seam ([`rpc::LedgerRpc`], [`rpc::RpcConnector`]) and its Solana implementation
//! - Ordered endpoint failover with blockhash leases
//! - Transfer message construction

/// Ordered endpoint failover.
pub mod endpoint_pool;
/// Prelude module for convenient imports.
pub mod prelude;
/// RPC access.
pub mod rpc;
/// Transfer message construction.
pub mod transfer;
