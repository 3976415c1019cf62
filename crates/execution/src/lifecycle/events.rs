//! Lifecycle events for transfer submissions.

use serde::{Deserialize, Serialize};
use solpay_domain::{Address, ErrorKind, MinorUnits};
use uuid::Uuid;

/// Type of lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionEventType {
    /// Recipient and amount passed validation.
    Validated,
    /// An endpoint produced a blockhash lease.
    ConnectionAcquired,
    /// The wallet broadcast the transaction.
    Broadcast,
    /// Confirmation was observed.
    Confirmed,
    /// Polling ended without confirmation.
    TimedOut,
    /// The submission failed.
    Failed,
}

/// A lifecycle event for a submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionEvent {
    /// Event ID.
    pub id: String,
    /// Submission the event belongs to.
    pub submission: Uuid,
    /// Event type.
    pub event_type: SubmissionEventType,
    /// Timestamp.
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Event-specific data.
    pub data: EventData,
}

impl SubmissionEvent {
    /// Creates a new lifecycle event.
    pub fn new(submission: Uuid, event_type: SubmissionEventType, data: EventData) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            submission,
            event_type,
            timestamp: chrono::Utc::now(),
            data,
        }
    }
}

/// Event-specific data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventData {
    /// Validated transfer.
    Validated {
        /// Recipient address.
        recipient: Address,
        /// Amount in minor units.
        amount: MinorUnits,
    },
    /// Endpoint that answered.
    ConnectionAcquired {
        /// Endpoint URL.
        endpoint: String,
        /// Last block height the lease is valid for.
        last_valid_block_height: u64,
    },
    /// Broadcast signature.
    Broadcast {
        /// Transaction signature.
        signature: String,
    },
    /// Polling result.
    Polled {
        /// Status queries made.
        attempts: u32,
    },
    /// Failure.
    Failed {
        /// Error kind.
        kind: ErrorKind,
        /// Error detail.
        detail: String,
    },
    /// No extra data.
    Empty,
}
