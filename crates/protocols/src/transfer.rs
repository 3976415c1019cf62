//! System-program transfer message construction.

use crate::endpoint_pool::{BlockhashLease, LiveConnection};
use solana_sdk::hash::Hash;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::message::{VersionedMessage, v0};
use solana_sdk::pubkey::Pubkey;
use solpay_domain::{TransferError, TransferRequest};
use tracing::debug;

/// System program ID (all-zero key, `11111111111111111111111111111111`).
pub const SYSTEM_PROGRAM_ID: Pubkey = Pubkey::new_from_array([0u8; 32]);

/// Index of `Transfer` in the system program's instruction enum.
const TRANSFER_DISCRIMINANT: u32 = 2;

/// A versioned message ready to be handed to a wallet for signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedMessage {
    message: VersionedMessage,
    last_valid_block_height: u64,
}

impl UnsignedMessage {
    /// The compiled message.
    pub fn message(&self) -> &VersionedMessage {
        &self.message
    }

    /// Blockhash the message is bound to.
    pub fn recent_blockhash(&self) -> &Hash {
        self.message.recent_blockhash()
    }

    /// Last block height at which the message can land.
    pub fn last_valid_block_height(&self) -> u64 {
        self.last_valid_block_height
    }

    /// Wire encoding of the message.
    pub fn serialize(&self) -> Vec<u8> {
        self.message.serialize()
    }
}

/// Builds single-transfer messages.
#[derive(Debug, Clone)]
pub struct TransferBuilder {
    system_program: Pubkey,
}

impl TransferBuilder {
    /// Creates a builder targeting the native system program.
    pub fn new() -> Self {
        Self {
            system_program: SYSTEM_PROGRAM_ID,
        }
    }

    /// Builds the message for `request` bound to the connection's blockhash.
    ///
    /// # Errors
    /// [`TransferError::BlockhashExpired`] if the lease had already expired,
    /// [`TransferError::InvalidRecipient`] for a self-transfer.
    pub fn build(
        &self,
        request: &TransferRequest,
        connection: &LiveConnection,
    ) -> Result<UnsignedMessage, TransferError> {
        self.build_with_lease(request, &connection.lease)
    }

    /// Same as [`TransferBuilder::build`] for a bare lease.
    pub fn build_with_lease(
        &self,
        request: &TransferRequest,
        lease: &BlockhashLease,
    ) -> Result<UnsignedMessage, TransferError> {
        if lease.is_expired() {
            return Err(TransferError::BlockhashExpired(format!(
                "blockhash {} expired at height {}, current height {}",
                lease.blockhash, lease.last_valid_block_height, lease.observed_block_height
            )));
        }

        if request.payer == request.recipient {
            return Err(TransferError::InvalidRecipient {
                address: request.recipient.to_string(),
                reason: "recipient is the paying wallet".to_string(),
            });
        }

        let payer = request.payer.pubkey();
        let ix =
            self.transfer_instruction(&payer, &request.recipient.pubkey(), request.amount.raw());

        let message = v0::Message::try_compile(&payer, &[ix], &[], lease.blockhash)
            .map_err(|e| TransferError::UnknownTransportError(format!("message compile: {e}")))?;

        debug!(
            payer = %payer,
            recipient = %request.recipient,
            lamports = request.amount.raw(),
            blockhash = %lease.blockhash,
            "Built transfer message"
        );

        Ok(UnsignedMessage {
            message: VersionedMessage::V0(message),
            last_valid_block_height: lease.last_valid_block_height,
        })
    }

    /// Encodes a system-program transfer of `lamports` from `from` to `to`.
    pub fn transfer_instruction(&self, from: &Pubkey, to: &Pubkey, lamports: u64) -> Instruction {
        let mut data = Vec::with_capacity(12);
        data.extend_from_slice(&TRANSFER_DISCRIMINANT.to_le_bytes());
        data.extend_from_slice(&lamports.to_le_bytes());

        let accounts = vec![
            AccountMeta::new(*from, true), // funding account
            AccountMeta::new(*to, false),  // recipient
        ];

        Instruction {
            program_id: self.system_program,
            accounts,
            data,
        }
    }
}

impl Default for TransferBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solpay_domain::{Address, MinorUnits, UnitScale};
    use std::str::FromStr;

    fn lease(seed: u8) -> BlockhashLease {
        BlockhashLease {
            blockhash: Hash::new_from_array([seed; 32]),
            last_valid_block_height: 1_150,
            observed_block_height: 1_000,
        }
    }

    fn request(amount: MinorUnits) -> TransferRequest {
        TransferRequest::new(
            Address::from_pubkey(Pubkey::new_unique()),
            Address::from_pubkey(Pubkey::new_unique()),
            amount,
        )
        .unwrap()
    }

    #[test]
    fn test_system_program_id() {
        assert_eq!(
            SYSTEM_PROGRAM_ID,
            Pubkey::from_str("11111111111111111111111111111111").unwrap()
        );
    }

    #[test]
    fn test_encodes_exact_lamports() {
        let amount = MinorUnits::parse_major("0.01", UnitScale::SOL).unwrap();
        let req = request(amount);

        let unsigned = TransferBuilder::new().build_with_lease(&req, &lease(7)).unwrap();

        let instructions = unsigned.message().instructions();
        assert_eq!(instructions.len(), 1);
        let data = &instructions[0].data;
        assert_eq!(data.len(), 12);
        assert_eq!(&data[..4], &2u32.to_le_bytes());
        assert_eq!(u64::from_le_bytes(data[4..].try_into().unwrap()), 10_000_000);
    }

    #[test]
    fn test_binds_lease_blockhash_and_payer() {
        let req = request(MinorUnits::new(5));

        let unsigned = TransferBuilder::new().build_with_lease(&req, &lease(9)).unwrap();

        assert!(matches!(unsigned.message(), VersionedMessage::V0(_)));
        assert_eq!(unsigned.recent_blockhash(), &Hash::new_from_array([9; 32]));
        assert_eq!(unsigned.last_valid_block_height(), 1_150);

        let keys = unsigned.message().static_account_keys();
        assert_eq!(keys[0], req.payer.pubkey());
        assert!(keys.contains(&req.recipient.pubkey()));
        assert!(keys.contains(&SYSTEM_PROGRAM_ID));
        assert!(!unsigned.serialize().is_empty());
    }

    #[test]
    fn test_expired_lease_is_rejected() {
        let mut expired = lease(1);
        expired.observed_block_height = 1_151;

        let result =
            TransferBuilder::new().build_with_lease(&request(MinorUnits::new(5)), &expired);

        assert!(matches!(result, Err(TransferError::BlockhashExpired(_))));
    }

    #[test]
    fn test_self_transfer_is_rejected() {
        let wallet = Address::from_pubkey(Pubkey::new_unique());
        let req = TransferRequest::new(wallet, wallet, MinorUnits::new(5)).unwrap();

        let result = TransferBuilder::new().build_with_lease(&req, &lease(1));

        assert!(matches!(result, Err(TransferError::InvalidRecipient { .. })));
    }
}
