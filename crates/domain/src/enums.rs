use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Terminal state of confirmation polling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfirmationOutcome {
    /// The signature reached the requested commitment without error.
    Confirmed,
    /// Polling ran out of attempts; the broadcast may still land.
    TimedOutUnconfirmed { attempts: u32 },
    /// The ledger executed the transaction and reported an error.
    FailedOnChain { payload: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl FromStr for Commitment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "processed" => Ok(Self::Processed),
            "confirmed" => Ok(Self::Confirmed),
            "finalized" => Ok(Self::Finalized),
            other => Err(format!("unknown commitment level: {other}")),
        }
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Processed => "processed",
            Self::Confirmed => "confirmed",
            Self::Finalized => "finalized",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commitment_parsing() {
        assert_eq!("confirmed".parse::<Commitment>(), Ok(Commitment::Confirmed));
        assert_eq!("FINALIZED".parse::<Commitment>(), Ok(Commitment::Finalized));
        assert!("max".parse::<Commitment>().is_err());
        assert_eq!(Commitment::default(), Commitment::Confirmed);
    }
}
