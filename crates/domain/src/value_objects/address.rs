//! Ledger address validation.

use crate::errors::TransferError;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::fmt;
use std::str::FromStr;

/// Longest base58 rendering of a 32-byte key.
const MAX_BASE58_LEN: usize = 44;

/// A syntactically valid ledger address.
///
/// Construction goes through [`Address::validate`], so holding an `Address`
/// means the string decoded to exactly 32 bytes of base58.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(Pubkey);

impl Address {
    /// Validates a base58 address string.
    ///
    /// Pure and synchronous: no network access, no caching.
    ///
    /// # Errors
    /// Returns [`TransferError::InvalidRecipient`] for empty, padded,
    /// non-base58 or wrong-length input.
    pub fn validate(address: &str) -> Result<Self, TransferError> {
        let reject = |reason: &str| TransferError::InvalidRecipient {
            address: address.to_string(),
            reason: reason.to_string(),
        };

        if address.is_empty() {
            return Err(reject("address is empty"));
        }
        if address.trim() != address {
            return Err(reject("address has surrounding whitespace"));
        }
        if address.len() > MAX_BASE58_LEN {
            return Err(reject("address is too long"));
        }

        Pubkey::from_str(address)
            .map(Self)
            .map_err(|e| reject(&e.to_string()))
    }

    /// Wraps an already-decoded public key.
    #[must_use]
    pub fn from_pubkey(pubkey: Pubkey) -> Self {
        Self(pubkey)
    }

    /// Returns the underlying public key.
    #[must_use]
    pub fn pubkey(&self) -> Pubkey {
        self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Address {
    type Err = TransferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::validate(s)
    }
}

impl TryFrom<String> for Address {
    type Error = TransferError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::validate(&value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.to_string()
    }
}
