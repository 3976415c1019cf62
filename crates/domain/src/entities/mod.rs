pub mod endpoint;
pub mod transfer;

pub use endpoint::{Endpoint, EndpointFailure, FailureReason};
pub use transfer::{TransferReceipt, TransferRequest};
