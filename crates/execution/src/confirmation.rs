//! Bounded confirmation polling.

use solpay_domain::{Commitment, ConfirmationOutcome};
use solpay_protocols::rpc::{LedgerRpc, SignatureState};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Confirmation polling configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Maximum number of status queries.
    pub max_attempts: u32,
    /// Delay between queries.
    pub interval: Duration,
    /// Upper bound for a single status query.
    pub request_timeout: Duration,
    /// Level at which a transaction counts as confirmed.
    pub commitment: Commitment,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            interval: Duration::from_millis(2_000),
            request_timeout: Duration::from_millis(10_000),
            commitment: Commitment::Confirmed,
        }
    }
}

/// Polls a signature until it reaches a terminal state or the attempt
/// budget runs out.
#[derive(Debug, Clone, Default)]
pub struct ConfirmationPoller {
    config: PollConfig,
}

impl ConfirmationPoller {
    /// Creates a poller.
    pub fn new(config: PollConfig) -> Self {
        Self { config }
    }

    /// Polling configuration.
    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Polls `signature` on `rpc`.
    ///
    /// Transport errors and not-yet-visible signatures count as attempts
    /// and never end polling early. There is no sleep after the last
    /// attempt, so the worst case is `max_attempts` queries and
    /// `max_attempts - 1` intervals.
    pub async fn confirm(&self, signature: &str, rpc: &dyn LedgerRpc) -> ConfirmationOutcome {
        let PollConfig {
            max_attempts,
            interval,
            request_timeout,
            commitment,
        } = self.config;

        for attempt in 1..=max_attempts {
            let state =
                tokio::time::timeout(request_timeout, rpc.signature_state(signature, commitment))
                    .await;

            match state {
                Ok(Ok(SignatureState::Succeeded)) => {
                    info!(signature = %signature, attempt, "Transaction confirmed");
                    return ConfirmationOutcome::Confirmed;
                }
                Ok(Ok(SignatureState::Failed(payload))) => {
                    warn!(signature = %signature, error = %payload, "Transaction failed on chain");
                    return ConfirmationOutcome::FailedOnChain { payload };
                }
                Ok(Ok(SignatureState::NotFound | SignatureState::Processing)) => {
                    debug!(signature = %signature, attempt, max_attempts, "Not yet confirmed");
                }
                Ok(Err(err)) => {
                    debug!(signature = %signature, attempt, error = %err, "Status query failed");
                }
                Err(_) => {
                    debug!(signature = %signature, attempt, "Status query timed out");
                }
            }

            if attempt < max_attempts {
                tokio::time::sleep(interval).await;
            }
        }

        warn!(
            signature = %signature,
            attempts = max_attempts,
            "Confirmation not observed before polling ended"
        );
        ConfirmationOutcome::TimedOutUnconfirmed {
            attempts: max_attempts,
        }
    }
}
