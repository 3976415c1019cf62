//! Ordered endpoint failover.
//!
//! Endpoints are tried one at a time in priority order. Each attempt opens a
//! transport handle and fetches a blockhash lease under a per-endpoint
//! timeout; the first endpoint that answers wins. Attempts are never raced,
//! so a submission costs at most one request budget per endpoint.

use crate::rpc::{LedgerRpc, RpcConnector, RpcError};
use solana_sdk::hash::Hash;
use solpay_domain::{Commitment, Endpoint, EndpointFailure, TransferError};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Blockhash lease obtained from one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockhashLease {
    /// Recent blockhash the transaction will be bound to.
    pub blockhash: Hash,
    /// Last block height at which the blockhash is accepted.
    pub last_valid_block_height: u64,
    /// Block height observed when the lease was taken.
    pub observed_block_height: u64,
}

impl BlockhashLease {
    /// Whether the lease had already expired when it was observed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.observed_block_height > self.last_valid_block_height
    }
}

/// A transport handle plus a fresh blockhash lease, scoped to one submission.
pub struct LiveConnection {
    /// Endpoint that produced the lease.
    pub endpoint: Endpoint,
    /// Open transport handle.
    pub rpc: Arc<dyn LedgerRpc>,
    /// Blockhash lease.
    pub lease: BlockhashLease,
    /// When the lease was acquired.
    pub acquired_at: Instant,
}

impl fmt::Debug for LiveConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveConnection")
            .field("endpoint", &self.endpoint)
            .field("lease", &self.lease)
            .field("acquired_at", &self.acquired_at)
            .finish_non_exhaustive()
    }
}

/// Result of probing a single endpoint.
#[derive(Debug, Clone)]
pub struct ProbeReport {
    /// Probed endpoint.
    pub endpoint: Endpoint,
    /// Time the attempt took.
    pub latency: Duration,
    /// Lease on success, failure record otherwise.
    pub outcome: Result<BlockhashLease, EndpointFailure>,
}

/// Ordered list of candidate endpoints.
pub struct EndpointPool {
    endpoints: Vec<Endpoint>,
    connector: Arc<dyn RpcConnector>,
    per_endpoint_timeout: Duration,
    commitment: Commitment,
}

impl EndpointPool {
    /// Creates a pool. Endpoints are ordered by priority; ties keep
    /// configuration order.
    pub fn new(
        mut endpoints: Vec<Endpoint>,
        connector: Arc<dyn RpcConnector>,
        per_endpoint_timeout: Duration,
    ) -> Self {
        endpoints.sort_by_key(|e| e.priority);
        Self {
            endpoints,
            connector,
            per_endpoint_timeout,
            commitment: Commitment::Confirmed,
        }
    }

    /// Sets the commitment used for blockhash requests.
    #[must_use]
    pub fn with_commitment(mut self, commitment: Commitment) -> Self {
        self.commitment = commitment;
        self
    }

    /// Endpoints in the order they are tried.
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// Per-endpoint timeout.
    pub fn per_endpoint_timeout(&self) -> Duration {
        self.per_endpoint_timeout
    }

    /// Acquires a live connection from the first endpoint that answers.
    ///
    /// # Errors
    /// Returns [`TransferError::NetworkUnavailable`] with every endpoint's
    /// failure once the list is exhausted.
    pub async fn acquire(&self) -> Result<LiveConnection, TransferError> {
        let total = self.endpoints.len();
        let mut failures = Vec::with_capacity(total);

        for (i, endpoint) in self.endpoints.iter().enumerate() {
            info!(
                endpoint = %endpoint.url,
                "[{}/{}] Attempting endpoint",
                i + 1,
                total
            );

            match self.try_endpoint(endpoint).await {
                Ok(connection) => {
                    info!(
                        endpoint = %endpoint.url,
                        blockhash = %connection.lease.blockhash,
                        last_valid_block_height = connection.lease.last_valid_block_height,
                        "Connected to endpoint"
                    );
                    return Ok(connection);
                }
                Err(err) => {
                    warn!(endpoint = %endpoint.url, error = %err, "Endpoint failed");
                    failures.push(EndpointFailure {
                        url: endpoint.url.clone(),
                        reason: err.failure_reason(),
                        detail: err.to_string(),
                    });
                }
            }
        }

        warn!(attempted = total, "All RPC endpoints failed");
        Err(TransferError::NetworkUnavailable { failures })
    }

    /// Attempts every endpoint in order and reports each result.
    pub async fn probe(&self) -> Vec<ProbeReport> {
        let mut reports = Vec::with_capacity(self.endpoints.len());

        for endpoint in &self.endpoints {
            let started = Instant::now();
            let outcome = self
                .try_endpoint(endpoint)
                .await
                .map(|connection| connection.lease)
                .map_err(|err| EndpointFailure {
                    url: endpoint.url.clone(),
                    reason: err.failure_reason(),
                    detail: err.to_string(),
                });

            reports.push(ProbeReport {
                endpoint: endpoint.clone(),
                latency: started.elapsed(),
                outcome,
            });
        }

        reports
    }

    async fn try_endpoint(&self, endpoint: &Endpoint) -> Result<LiveConnection, RpcError> {
        let attempt = async {
            let rpc = self.connector.connect(endpoint).await?;
            let latest = rpc.latest_blockhash(self.commitment).await?;
            let observed_block_height = rpc.block_height(self.commitment).await?;
            Ok::<_, RpcError>((rpc, latest, observed_block_height))
        };

        let (rpc, latest, observed_block_height) =
            tokio::time::timeout(self.per_endpoint_timeout, attempt)
                .await
                .map_err(|_| RpcError::Timeout(self.per_endpoint_timeout))??;

        if latest.blockhash == Hash::default() {
            return Err(RpcError::Malformed("endpoint returned an empty blockhash".to_string()));
        }

        Ok(LiveConnection {
            endpoint: endpoint.clone(),
            rpc,
            lease: BlockhashLease {
                blockhash: latest.blockhash,
                last_valid_block_height: latest.last_valid_block_height,
                observed_block_height,
            },
            acquired_at: Instant::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::scripted::{RpcCall, ScriptedConnector, ScriptedRpc};
    use solpay_domain::FailureReason;

    fn pool(connector: Arc<ScriptedConnector>, urls: &[&str]) -> EndpointPool {
        EndpointPool::new(
            Endpoint::from_urls(urls.iter().copied()),
            connector,
            Duration::from_millis(10_000),
        )
    }

    #[tokio::test]
    async fn test_first_healthy_endpoint_wins() {
        let connector = Arc::new(ScriptedConnector::new([
            ScriptedRpc::healthy("https://a", 1),
            ScriptedRpc::healthy("https://b", 2),
        ]));
        let pool = pool(connector.clone(), &["https://a", "https://b"]);

        let connection = pool.acquire().await.unwrap();

        assert_eq!(connection.endpoint.url, "https://a");
        assert_eq!(connection.lease.blockhash, Hash::new_from_array([1; 32]));
        assert_eq!(connector.connected_urls(), vec!["https://a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fails_over_in_order() {
        let connector = Arc::new(ScriptedConnector::new([
            ScriptedRpc::failing("https://a", RpcError::Rpc("429 Too Many Requests".to_string())),
            ScriptedRpc::hanging("https://b"),
            ScriptedRpc::healthy("https://d", 4),
        ]));
        // https://c has no scripted endpoint and fails to connect.
        let pool = pool(
            connector.clone(),
            &["https://a", "https://b", "https://c", "https://d"],
        );

        let connection = pool.acquire().await.unwrap();

        assert_eq!(connection.endpoint.url, "https://d");
        assert_eq!(connection.lease.blockhash, Hash::new_from_array([4; 32]));
        assert_eq!(
            connector.connected_urls(),
            vec!["https://a", "https://b", "https://c", "https://d"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_aggregates_failures() {
        let connector = Arc::new(ScriptedConnector::new([
            ScriptedRpc::hanging("https://a"),
            ScriptedRpc::failing("https://b", RpcError::Malformed("eof".to_string())),
        ]));
        let pool = pool(connector.clone(), &["https://a", "https://b", "https://c"]);

        let err = pool.acquire().await.unwrap_err();

        let TransferError::NetworkUnavailable { failures } = err else {
            panic!("expected NetworkUnavailable");
        };
        let reasons: Vec<_> = failures.iter().map(|f| (f.url.as_str(), f.reason)).collect();
        assert_eq!(
            reasons,
            vec![
                ("https://a", FailureReason::Timeout),
                ("https://b", FailureReason::Malformed),
                ("https://c", FailureReason::Connect),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_pool_fails_without_calls() {
        let connector = Arc::new(ScriptedConnector::new([]));
        let pool = pool(connector.clone(), &[]);

        let err = pool.acquire().await.unwrap_err();

        assert_eq!(err, TransferError::NetworkUnavailable { failures: vec![] });
        assert!(connector.calls().is_empty());
    }

    #[tokio::test]
    async fn test_priority_orders_attempts() {
        let connector = Arc::new(ScriptedConnector::new([
            ScriptedRpc::healthy("https://low", 1),
            ScriptedRpc::healthy("https://high", 2),
        ]));
        let pool = EndpointPool::new(
            vec![
                Endpoint::new("https://low", 5),
                Endpoint::new("https://high", 0),
            ],
            connector.clone(),
            Duration::from_secs(1),
        );

        let connection = pool.acquire().await.unwrap();

        assert_eq!(connection.endpoint.url, "https://high");
        assert_eq!(pool.endpoints()[1].url, "https://low");
    }

    #[tokio::test]
    async fn test_lease_records_observed_height() {
        let connector = Arc::new(ScriptedConnector::new([
            ScriptedRpc::healthy("https://a", 1).with_block_height(1_200)
        ]));
        let pool = pool(connector.clone(), &["https://a"]);

        let connection = pool.acquire().await.unwrap();

        assert_eq!(connection.lease.observed_block_height, 1_200);
        assert!(connection.lease.is_expired());
        assert_eq!(
            connector.calls(),
            vec![
                RpcCall::Connect("https://a".to_string()),
                RpcCall::Blockhash("https://a".to_string()),
                RpcCall::BlockHeight("https://a".to_string()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_reports_every_endpoint() {
        let connector = Arc::new(ScriptedConnector::new([
            ScriptedRpc::healthy("https://a", 1),
            ScriptedRpc::hanging("https://b"),
        ]));
        let pool = pool(connector.clone(), &["https://a", "https://b"]);

        let reports = pool.probe().await;

        assert_eq!(reports.len(), 2);
        assert!(reports[0].outcome.is_ok());
        assert_eq!(
            reports[1].outcome.as_ref().unwrap_err().reason,
            FailureReason::Timeout
        );
    }
}
