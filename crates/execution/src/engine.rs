//! Transfer submission engine.
//!
//! One call runs validate, acquire, build, sign-and-send and poll in
//! sequence. Every failure leaves as a classified [`TransferError`];
//! a confirmation that is not observed in time still returns a receipt,
//! flagged unconfirmed with a warning.

use crate::classifier::classify_rpc_error;
use crate::config::EngineConfig;
use crate::confirmation::ConfirmationPoller;
use crate::lifecycle::SubmissionTracker;
use crate::provider::ProviderBridge;
use rust_decimal::Decimal;
use solpay_domain::{
    Address, ConfirmationOutcome, MinorUnits, TransferError, TransferReceipt, TransferRequest,
    UnitScale,
};
use solpay_protocols::endpoint_pool::{EndpointPool, LiveConnection, ProbeReport};
use solpay_protocols::rpc::RpcConnector;
use solpay_protocols::transfer::TransferBuilder;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Submits native transfers through a wallet provider.
pub struct TransferEngine {
    config: EngineConfig,
    scale: UnitScale,
    pool: EndpointPool,
    builder: TransferBuilder,
    poller: ConfirmationPoller,
    bridge: Arc<ProviderBridge>,
    tracker: Arc<SubmissionTracker>,
}

impl TransferEngine {
    /// Creates an engine.
    ///
    /// # Errors
    /// [`TransferError::Configuration`] if `config` does not validate.
    pub fn new(
        config: EngineConfig,
        connector: Arc<dyn RpcConnector>,
        bridge: Arc<ProviderBridge>,
    ) -> Result<Self, TransferError> {
        config.validate()?;
        let scale = config.unit_scale()?;
        let pool = EndpointPool::new(
            config.endpoints.clone(),
            connector,
            config.endpoint_timeout(),
        )
        .with_commitment(config.commitment);
        let poller = ConfirmationPoller::new(config.poll_config());

        Ok(Self {
            config,
            scale,
            pool,
            builder: TransferBuilder::new(),
            poller,
            bridge,
            tracker: Arc::new(SubmissionTracker::new()),
        })
    }

    /// Replaces the submission tracker, e.g. to share one across engines.
    #[must_use]
    pub fn with_tracker(mut self, tracker: Arc<SubmissionTracker>) -> Self {
        self.tracker = tracker;
        self
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Unit scale used for amount conversion.
    pub fn unit_scale(&self) -> UnitScale {
        self.scale
    }

    /// Wallet provider bridge.
    pub fn bridge(&self) -> &Arc<ProviderBridge> {
        &self.bridge
    }

    /// Submission tracker.
    pub fn tracker(&self) -> &Arc<SubmissionTracker> {
        &self.tracker
    }

    /// Sends `amount` (major units) from the connected wallet to `recipient`.
    ///
    /// # Errors
    /// Input and acquisition failures surface before the wallet is
    /// prompted. Wallet failures are classified and never retried.
    /// [`TransferError::FailedOnChain`] carries the ledger's error payload.
    pub async fn submit_transfer(
        &self,
        recipient: &str,
        amount: Decimal,
    ) -> Result<TransferReceipt, TransferError> {
        let recipient = Address::validate(recipient)?;
        let amount = MinorUnits::from_major(amount, self.scale)?;
        let payer = self.bridge.connected_address().ok_or_else(|| {
            TransferError::ProviderUnavailable("wallet not connected".to_string())
        })?;
        let request = TransferRequest::new(payer, recipient, amount)?;

        let id = self.tracker.record_validated(recipient, amount).await;
        info!(
            submission = %id,
            payer = %payer,
            recipient = %recipient,
            lamports = amount.raw(),
            "Submitting transfer"
        );

        match self.execute(id, &request).await {
            Ok(receipt) => Ok(receipt),
            Err(err) => {
                warn!(
                    submission = %id,
                    kind = ?err.kind(),
                    pre_broadcast = err.is_pre_broadcast(),
                    error = %err,
                    "Transfer failed"
                );
                self.tracker.record_failed(id, &err).await;
                Err(err)
            }
        }
    }

    /// Sends `amount` (major units) to the configured treasury.
    ///
    /// # Errors
    /// [`TransferError::Configuration`] when no treasury is configured,
    /// otherwise as [`TransferEngine::submit_transfer`].
    pub async fn submit_to_treasury(
        &self,
        amount: Decimal,
    ) -> Result<TransferReceipt, TransferError> {
        let treasury = self.config.treasury.ok_or_else(|| {
            TransferError::Configuration("no treasury address configured".to_string())
        })?;
        self.submit_transfer(&treasury.to_string(), amount).await
    }

    /// Balance of `address` in minor units, read through the endpoint pool.
    pub async fn balance(&self, address: &Address) -> Result<MinorUnits, TransferError> {
        let connection = self.pool.acquire().await?;
        let lamports = connection
            .rpc
            .balance(&address.pubkey())
            .await
            .map_err(|e| classify_rpc_error(&e))?;
        Ok(MinorUnits::new(lamports))
    }

    /// Reports the health of every configured endpoint.
    pub async fn probe(&self) -> Vec<ProbeReport> {
        self.pool.probe().await
    }

    async fn execute(
        &self,
        id: Uuid,
        request: &TransferRequest,
    ) -> Result<TransferReceipt, TransferError> {
        let connection = self.pool.acquire().await?;
        self.tracker
            .record_connection(
                id,
                &connection.endpoint.url,
                connection.lease.last_valid_block_height,
            )
            .await;

        if self.config.preflight_balance_check {
            self.check_balance(&connection, request).await?;
        }

        let message = self.builder.build(request, &connection)?;
        let signature = self.bridge.sign_and_send(&message).await?;
        self.tracker.record_broadcast(id, &signature).await;

        let endpoint = connection.endpoint.url.as_str();
        match self
            .poller
            .confirm(&signature, connection.rpc.as_ref())
            .await
        {
            ConfirmationOutcome::Confirmed => {
                self.tracker.record_confirmed(id).await;
                Ok(TransferReceipt::confirmed(signature, endpoint, request).with_id(id))
            }
            ConfirmationOutcome::TimedOutUnconfirmed { attempts } => {
                let warning = TransferError::TimedOutUnconfirmed {
                    signature: signature.clone(),
                    attempts,
                }
                .user_message();
                self.tracker.record_timed_out(id, attempts).await;
                Ok(TransferReceipt::unconfirmed(signature, endpoint, request, warning).with_id(id))
            }
            ConfirmationOutcome::FailedOnChain { payload } => {
                Err(TransferError::FailedOnChain { signature, payload })
            }
        }
    }

    async fn check_balance(
        &self,
        connection: &LiveConnection,
        request: &TransferRequest,
    ) -> Result<(), TransferError> {
        match connection.rpc.balance(&request.payer.pubkey()).await {
            Ok(balance) if balance < request.amount.raw() => {
                Err(TransferError::InsufficientFunds(format!(
                    "balance {balance} lamports, transfer needs {}",
                    request.amount
                )))
            }
            Ok(_) => Ok(()),
            Err(err) => {
                // The wallet rejects an underfunded transfer anyway.
                warn!(error = %err, "Balance check failed, continuing");
                Ok(())
            }
        }
    }
}
