use crate::errors::TransferError;
use crate::value_objects::{Address, MinorUnits};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single native-asset transfer to be signed by the payer's wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub payer: Address,
    pub recipient: Address,
    pub amount: MinorUnits,
}

impl TransferRequest {
    /// Creates a request, rejecting zero amounts.
    pub fn new(
        payer: Address,
        recipient: Address,
        amount: MinorUnits,
    ) -> Result<Self, TransferError> {
        if amount.raw() == 0 {
            return Err(TransferError::InvalidAmount(
                "amount must be at least one minor unit".to_string(),
            ));
        }
        Ok(Self {
            payer,
            recipient,
            amount,
        })
    }
}

/// What the caller gets back once a transfer has been broadcast.
///
/// `confirmed == false` with a `warning` means the broadcast happened but
/// the final status is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub id: Uuid,
    pub signature: String,
    pub confirmed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub endpoint: String,
    pub recipient: Address,
    pub amount: MinorUnits,
    pub submitted_at: DateTime<Utc>,
}

impl TransferReceipt {
    pub fn confirmed(
        signature: impl Into<String>,
        endpoint: impl Into<String>,
        request: &TransferRequest,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            signature: signature.into(),
            confirmed: true,
            warning: None,
            endpoint: endpoint.into(),
            recipient: request.recipient,
            amount: request.amount,
            submitted_at: Utc::now(),
        }
    }

    /// A receipt for a broadcast whose confirmation could not be observed.
    pub fn unconfirmed(
        signature: impl Into<String>,
        endpoint: impl Into<String>,
        request: &TransferRequest,
        warning: impl Into<String>,
    ) -> Self {
        Self {
            confirmed: false,
            warning: Some(warning.into()),
            ..Self::confirmed(signature, endpoint, request)
        }
    }

    /// Replaces the generated receipt id, e.g. with a submission id.
    #[must_use]
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }
}
