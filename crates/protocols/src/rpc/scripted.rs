//! Scripted in-memory RPC used by tests across the workspace.

use super::{LatestBlockhash, LedgerRpc, RpcConnector, RpcError, SignatureState};
use async_trait::async_trait;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solpay_domain::{Commitment, Endpoint};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// How a scripted endpoint answers blockhash requests.
#[derive(Debug, Clone)]
pub enum BlockhashScript {
    /// Answer with this blockhash.
    Answer(LatestBlockhash),
    /// Fail with this error.
    Fail(RpcError),
    /// Never answer.
    Hang,
}

/// Calls observed by scripted endpoints, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcCall {
    /// Connector opened a handle.
    Connect(String),
    /// Blockhash requested.
    Blockhash(String),
    /// Block height requested.
    BlockHeight(String),
    /// Signature status requested.
    SignatureStatus(String),
    /// Balance requested.
    Balance(String),
}

/// Shared, ordered log of RPC calls.
pub type CallLog = Arc<Mutex<Vec<RpcCall>>>;

/// A [`LedgerRpc`] that replays scripted answers.
pub struct ScriptedRpc {
    url: String,
    blockhash: BlockhashScript,
    block_height: u64,
    balance: u64,
    statuses: Mutex<VecDeque<Result<SignatureState, RpcError>>>,
    log: CallLog,
    poll_times: Mutex<Vec<tokio::time::Instant>>,
}

impl ScriptedRpc {
    /// Creates an endpoint that answers with a deterministic blockhash.
    pub fn healthy(url: impl Into<String>, seed: u8) -> Self {
        Self::new(
            url,
            BlockhashScript::Answer(LatestBlockhash {
                blockhash: Hash::new_from_array([seed; 32]),
                last_valid_block_height: 1_150,
            }),
        )
    }

    /// Creates an endpoint whose blockhash request fails.
    pub fn failing(url: impl Into<String>, error: RpcError) -> Self {
        Self::new(url, BlockhashScript::Fail(error))
    }

    /// Creates an endpoint that never answers blockhash requests.
    pub fn hanging(url: impl Into<String>) -> Self {
        Self::new(url, BlockhashScript::Hang)
    }

    fn new(url: impl Into<String>, blockhash: BlockhashScript) -> Self {
        Self {
            url: url.into(),
            blockhash,
            block_height: 1_000,
            balance: u64::MAX,
            statuses: Mutex::new(VecDeque::new()),
            log: Arc::new(Mutex::new(Vec::new())),
            poll_times: Mutex::new(Vec::new()),
        }
    }

    /// Sets the block height reported by this endpoint.
    #[must_use]
    pub fn with_block_height(mut self, height: u64) -> Self {
        self.block_height = height;
        self
    }

    /// Sets the balance reported for every account.
    #[must_use]
    pub fn with_balance(mut self, lamports: u64) -> Self {
        self.balance = lamports;
        self
    }

    /// Queues signature status answers; once drained, answers `NotFound`.
    #[must_use]
    pub fn with_statuses(
        self,
        statuses: impl IntoIterator<Item = Result<SignatureState, RpcError>>,
    ) -> Self {
        self.statuses
            .lock()
            .expect("status script poisoned")
            .extend(statuses);
        self
    }

    /// Records calls into a shared log.
    #[must_use]
    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    /// Instants at which signature status was requested.
    pub fn poll_times(&self) -> Vec<tokio::time::Instant> {
        self.poll_times.lock().expect("poll log poisoned").clone()
    }

    /// Number of signature status requests.
    pub fn poll_count(&self) -> usize {
        self.poll_times.lock().expect("poll log poisoned").len()
    }

    fn record(&self, call: RpcCall) {
        self.log.lock().expect("call log poisoned").push(call);
    }
}

#[async_trait]
impl LedgerRpc for ScriptedRpc {
    fn url(&self) -> &str {
        &self.url
    }

    async fn latest_blockhash(&self, _commitment: Commitment) -> Result<LatestBlockhash, RpcError> {
        self.record(RpcCall::Blockhash(self.url.clone()));
        match &self.blockhash {
            BlockhashScript::Answer(latest) => Ok(*latest),
            BlockhashScript::Fail(err) => Err(err.clone()),
            BlockhashScript::Hang => std::future::pending().await,
        }
    }

    async fn block_height(&self, _commitment: Commitment) -> Result<u64, RpcError> {
        self.record(RpcCall::BlockHeight(self.url.clone()));
        Ok(self.block_height)
    }

    async fn signature_state(
        &self,
        signature: &str,
        _commitment: Commitment,
    ) -> Result<SignatureState, RpcError> {
        self.record(RpcCall::SignatureStatus(signature.to_string()));
        self.poll_times
            .lock()
            .expect("poll log poisoned")
            .push(tokio::time::Instant::now());
        self.statuses
            .lock()
            .expect("status script poisoned")
            .pop_front()
            .unwrap_or(Ok(SignatureState::NotFound))
    }

    async fn balance(&self, address: &Pubkey) -> Result<u64, RpcError> {
        self.record(RpcCall::Balance(address.to_string()));
        Ok(self.balance)
    }
}

/// A [`RpcConnector`] over a fixed set of scripted endpoints.
///
/// URLs without a scripted endpoint fail to connect.
pub struct ScriptedConnector {
    endpoints: HashMap<String, Arc<ScriptedRpc>>,
    log: CallLog,
}

impl ScriptedConnector {
    /// Creates a connector; each endpoint's calls are added to a shared log.
    pub fn new(endpoints: impl IntoIterator<Item = ScriptedRpc>) -> Self {
        let log: CallLog = Arc::new(Mutex::new(Vec::new()));
        let endpoints = endpoints
            .into_iter()
            .map(|rpc| {
                let rpc = rpc.with_log(log.clone());
                (rpc.url.clone(), Arc::new(rpc))
            })
            .collect();
        Self { endpoints, log }
    }

    /// Returns the scripted endpoint for `url`.
    pub fn endpoint(&self, url: &str) -> Option<Arc<ScriptedRpc>> {
        self.endpoints.get(url).cloned()
    }

    /// Snapshot of the call log.
    pub fn calls(&self) -> Vec<RpcCall> {
        self.log.lock().expect("call log poisoned").clone()
    }

    /// URLs passed to `connect`, in order.
    pub fn connected_urls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RpcCall::Connect(url) => Some(url),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl RpcConnector for ScriptedConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Arc<dyn LedgerRpc>, RpcError> {
        self.log
            .lock()
            .expect("call log poisoned")
            .push(RpcCall::Connect(endpoint.url.clone()));

        match self.endpoints.get(&endpoint.url) {
            Some(rpc) => Ok(rpc.clone() as Arc<dyn LedgerRpc>),
            None => Err(RpcError::Connect(format!("no route to {}", endpoint.url))),
        }
    }
}
