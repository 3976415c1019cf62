use crate::errors::TransferError;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of minor units per major unit, expressed as a power of ten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitScale {
    decimals: u32,
}

impl UnitScale {
    /// Lamports per SOL (1e9).
    pub const SOL: Self = Self { decimals: 9 };

    /// Largest scale whose factor still fits in a `u64`.
    pub const MAX_DECIMALS: u32 = 18;

    /// Creates a scale of `10^decimals` minor units per major unit.
    pub fn new(decimals: u32) -> Result<Self, TransferError> {
        if decimals > Self::MAX_DECIMALS {
            return Err(TransferError::Configuration(format!(
                "unit scale of {decimals} decimals does not fit in 64 bits"
            )));
        }
        Ok(Self { decimals })
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    /// Minor units per major unit.
    pub fn factor(&self) -> u64 {
        10u64.pow(self.decimals)
    }
}

impl Default for UnitScale {
    fn default() -> Self {
        Self::SOL
    }
}

/// An integer amount in the smallest indivisible unit.
///
/// Always strictly positive when produced by [`MinorUnits::from_major`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MinorUnits(u64);

impl MinorUnits {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Converts a major-unit amount by truncating `amount * scale`.
    ///
    /// Arithmetic is exact decimal, so `0.01` at scale 1e9 is exactly
    /// `10_000_000`.
    pub fn from_major(amount: Decimal, scale: UnitScale) -> Result<Self, TransferError> {
        if amount <= Decimal::ZERO {
            return Err(TransferError::InvalidAmount(format!(
                "amount must be positive, got {amount}"
            )));
        }

        let raw = amount
            .checked_mul(Decimal::from(scale.factor()))
            .map(|d| d.trunc())
            .and_then(|d| d.to_u64())
            .ok_or_else(|| TransferError::InvalidAmount(format!("amount {amount} is too large")))?;

        if raw == 0 {
            return Err(TransferError::InvalidAmount(format!(
                "amount {amount} is below one minor unit"
            )));
        }

        Ok(Self(raw))
    }

    /// Parses a decimal string such as `"0.01"` as a major-unit amount.
    pub fn parse_major(amount: &str, scale: UnitScale) -> Result<Self, TransferError> {
        let parsed = Decimal::from_str(amount.trim())
            .map_err(|e| TransferError::InvalidAmount(format!("{amount:?}: {e}")))?;
        Self::from_major(parsed, scale)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Converts back to major units.
    pub fn to_major(&self, scale: UnitScale) -> Decimal {
        Decimal::from(self.0) / Decimal::from(scale.factor())
    }
}

impl fmt::Display for MinorUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_cent_of_sol_is_exact() {
        let amount = MinorUnits::from_major(dec!(0.01), UnitScale::SOL).unwrap();
        assert_eq!(amount.raw(), 10_000_000);

        let parsed = MinorUnits::parse_major("0.01", UnitScale::SOL).unwrap();
        assert_eq!(parsed, amount);
    }

    #[test]
    fn test_truncates_sub_unit_remainder() {
        let amount = MinorUnits::from_major(dec!(1.0000000019), UnitScale::SOL).unwrap();
        assert_eq!(amount.raw(), 1_000_000_001);
    }

    #[test]
    fn test_rejects_non_positive_and_dust() {
        assert!(matches!(
            MinorUnits::from_major(Decimal::ZERO, UnitScale::SOL),
            Err(TransferError::InvalidAmount(_))
        ));
        assert!(matches!(
            MinorUnits::from_major(dec!(-1), UnitScale::SOL),
            Err(TransferError::InvalidAmount(_))
        ));
        assert!(matches!(
            MinorUnits::from_major(dec!(0.0000000001), UnitScale::SOL),
            Err(TransferError::InvalidAmount(_))
        ));
        assert!(matches!(
            MinorUnits::parse_major("one sol", UnitScale::SOL),
            Err(TransferError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_rejects_overflow() {
        let result = MinorUnits::from_major(dec!(100000000000), UnitScale::SOL);
        assert!(matches!(result, Err(TransferError::InvalidAmount(_))));
    }

    #[test]
    fn test_scale_bounds() {
        assert_eq!(UnitScale::new(6).unwrap().factor(), 1_000_000);
        assert!(UnitScale::new(19).is_err());
    }

    #[test]
    fn test_to_major() {
        let amount = MinorUnits::new(1_500_000_000);
        assert_eq!(amount.to_major(UnitScale::SOL), dec!(1.5));
    }
}
