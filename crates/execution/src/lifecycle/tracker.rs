//! Lifecycle tracker for submission history.

use super::{EventData, SubmissionEvent, SubmissionEventType};
use serde::Serialize;
use solpay_domain::{Address, ErrorKind, MinorUnits, TransferError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Where a submission currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Still being processed.
    InFlight,
    /// Confirmation observed.
    Confirmed,
    /// Broadcast, confirmation not observed.
    Unconfirmed,
    /// Ended with an error.
    Failed,
}

/// Summary of a submission's lifecycle.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionSummary {
    /// Submission ID.
    pub id: Uuid,
    /// Recipient address.
    pub recipient: Address,
    /// Amount in minor units.
    pub amount: MinorUnits,
    /// Endpoint used, once acquired.
    pub endpoint: Option<String>,
    /// Signature, once broadcast.
    pub signature: Option<String>,
    /// Current status.
    pub status: SubmissionStatus,
    /// Error kind for failed submissions.
    pub error_kind: Option<ErrorKind>,
    /// When the submission started.
    pub started_at: chrono::DateTime<chrono::Utc>,
    /// When it reached a final status.
    pub finished_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Tracks lifecycle events for all submissions.
pub struct SubmissionTracker {
    /// Events by submission.
    events: Arc<RwLock<HashMap<Uuid, Vec<SubmissionEvent>>>>,
    /// Submission summaries.
    summaries: Arc<RwLock<HashMap<Uuid, SubmissionSummary>>>,
}

impl SubmissionTracker {
    /// Creates a new tracker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Arc::new(RwLock::new(HashMap::new())),
            summaries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Starts tracking a validated submission and returns its ID.
    pub async fn record_validated(&self, recipient: Address, amount: MinorUnits) -> Uuid {
        let id = Uuid::new_v4();
        let event = SubmissionEvent::new(
            id,
            SubmissionEventType::Validated,
            EventData::Validated { recipient, amount },
        );

        self.add_event(event.clone()).await;

        let summary = SubmissionSummary {
            id,
            recipient,
            amount,
            endpoint: None,
            signature: None,
            status: SubmissionStatus::InFlight,
            error_kind: None,
            started_at: event.timestamp,
            finished_at: None,
        };
        self.summaries.write().await.insert(id, summary);

        debug!(submission = %id, recipient = %recipient, lamports = amount.raw(), "Submission validated");
        id
    }

    /// Records the endpoint that produced the blockhash lease.
    pub async fn record_connection(&self, id: Uuid, endpoint: &str, last_valid_block_height: u64) {
        self.add_event(SubmissionEvent::new(
            id,
            SubmissionEventType::ConnectionAcquired,
            EventData::ConnectionAcquired {
                endpoint: endpoint.to_string(),
                last_valid_block_height,
            },
        ))
        .await;

        if let Some(summary) = self.summaries.write().await.get_mut(&id) {
            summary.endpoint = Some(endpoint.to_string());
        }
    }

    /// Records the broadcast signature.
    pub async fn record_broadcast(&self, id: Uuid, signature: &str) {
        self.add_event(SubmissionEvent::new(
            id,
            SubmissionEventType::Broadcast,
            EventData::Broadcast {
                signature: signature.to_string(),
            },
        ))
        .await;

        if let Some(summary) = self.summaries.write().await.get_mut(&id) {
            summary.signature = Some(signature.to_string());
        }

        info!(submission = %id, signature = %signature, "Transaction broadcast");
    }

    /// Records an observed confirmation.
    pub async fn record_confirmed(&self, id: Uuid) {
        self.add_event(SubmissionEvent::new(
            id,
            SubmissionEventType::Confirmed,
            EventData::Empty,
        ))
        .await;
        self.finish(id, SubmissionStatus::Confirmed, None).await;
    }

    /// Records that polling ended without confirmation.
    pub async fn record_timed_out(&self, id: Uuid, attempts: u32) {
        self.add_event(SubmissionEvent::new(
            id,
            SubmissionEventType::TimedOut,
            EventData::Polled { attempts },
        ))
        .await;
        self.finish(id, SubmissionStatus::Unconfirmed, None).await;
    }

    /// Records a failure.
    pub async fn record_failed(&self, id: Uuid, error: &TransferError) {
        self.add_event(SubmissionEvent::new(
            id,
            SubmissionEventType::Failed,
            EventData::Failed {
                kind: error.kind(),
                detail: error.to_string(),
            },
        ))
        .await;
        self.finish(id, SubmissionStatus::Failed, Some(error.kind()))
            .await;

        warn!(submission = %id, kind = %error.kind(), error = %error, "Submission failed");
    }

    async fn finish(&self, id: Uuid, status: SubmissionStatus, error_kind: Option<ErrorKind>) {
        if let Some(summary) = self.summaries.write().await.get_mut(&id) {
            summary.status = status;
            summary.error_kind = error_kind;
            summary.finished_at = Some(chrono::Utc::now());
        }
    }

    /// Adds an event to the tracker.
    async fn add_event(&self, event: SubmissionEvent) {
        let mut events = self.events.write().await;
        events.entry(event.submission).or_default().push(event);
    }

    /// Gets all events for a submission.
    pub async fn get_events(&self, id: &Uuid) -> Vec<SubmissionEvent> {
        self.events
            .read()
            .await
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    /// Gets the summary for a submission.
    pub async fn get_summary(&self, id: &Uuid) -> Option<SubmissionSummary> {
        self.summaries.read().await.get(id).cloned()
    }

    /// Gets all submission summaries, oldest first.
    pub async fn get_all_summaries(&self) -> Vec<SubmissionSummary> {
        let mut summaries: Vec<_> = self.summaries.read().await.values().cloned().collect();
        summaries.sort_by_key(|s| s.started_at);
        summaries
    }

    /// Gets aggregate statistics.
    pub async fn get_aggregate_stats(&self) -> AggregateStats {
        let summaries = self.summaries.read().await;

        let mut stats = AggregateStats::default();

        for summary in summaries.values() {
            stats.total += 1;
            match summary.status {
                SubmissionStatus::InFlight => stats.in_flight += 1,
                SubmissionStatus::Confirmed => stats.confirmed += 1,
                SubmissionStatus::Unconfirmed => stats.unconfirmed += 1,
                SubmissionStatus::Failed => stats.failed += 1,
            }
            if summary.status != SubmissionStatus::Failed {
                stats.total_lamports_sent =
                    stats.total_lamports_sent.saturating_add(summary.amount.raw());
            }
        }

        stats
    }
}

impl Default for SubmissionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregate statistics across all submissions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregateStats {
    /// Total submissions tracked.
    pub total: u32,
    /// Submissions still in flight.
    pub in_flight: u32,
    /// Confirmed submissions.
    pub confirmed: u32,
    /// Broadcast but unconfirmed submissions.
    pub unconfirmed: u32,
    /// Failed submissions.
    pub failed: u32,
    /// Minor units in confirmed, unconfirmed and in-flight submissions,
    /// saturating at `u64::MAX`.
    pub total_lamports_sent: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::pubkey::Pubkey;

    fn recipient() -> Address {
        Address::from_pubkey(Pubkey::new_unique())
    }

    #[tokio::test]
    async fn test_submission_lifecycle() {
        let tracker = SubmissionTracker::new();

        let id = tracker
            .record_validated(recipient(), MinorUnits::new(10_000_000))
            .await;
        tracker.record_connection(id, "https://a", 1_150).await;
        tracker.record_broadcast(id, "abc123").await;
        tracker.record_confirmed(id).await;

        let events = tracker.get_events(&id).await;
        let types: Vec<_> = events.iter().map(|e| e.event_type).collect();
        assert_eq!(
            types,
            vec![
                SubmissionEventType::Validated,
                SubmissionEventType::ConnectionAcquired,
                SubmissionEventType::Broadcast,
                SubmissionEventType::Confirmed,
            ]
        );

        let summary = tracker.get_summary(&id).await.unwrap();
        assert_eq!(summary.status, SubmissionStatus::Confirmed);
        assert_eq!(summary.endpoint.as_deref(), Some("https://a"));
        assert_eq!(summary.signature.as_deref(), Some("abc123"));
        assert!(summary.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_aggregate_stats() {
        let tracker = SubmissionTracker::new();

        let confirmed = tracker.record_validated(recipient(), MinorUnits::new(5)).await;
        tracker.record_confirmed(confirmed).await;

        let unconfirmed = tracker.record_validated(recipient(), MinorUnits::new(7)).await;
        tracker.record_timed_out(unconfirmed, 30).await;

        let failed = tracker.record_validated(recipient(), MinorUnits::new(100)).await;
        tracker
            .record_failed(failed, &TransferError::UserRejected)
            .await;

        let stats = tracker.get_aggregate_stats().await;
        assert_eq!(
            stats,
            AggregateStats {
                total: 3,
                in_flight: 0,
                confirmed: 1,
                unconfirmed: 1,
                failed: 1,
                total_lamports_sent: 12,
            }
        );
        assert_eq!(
            tracker.get_summary(&failed).await.unwrap().error_kind,
            Some(ErrorKind::UserRejected)
        );
    }

    #[tokio::test]
    async fn test_aggregate_total_saturates() {
        let tracker = SubmissionTracker::new();
        let large = MinorUnits::new(10_000_000_000 * 1_000_000_000);

        tracker.record_validated(recipient(), large).await;
        tracker.record_validated(recipient(), large).await;

        let stats = tracker.get_aggregate_stats().await;
        assert_eq!(stats.in_flight, 2);
        assert_eq!(stats.total_lamports_sent, u64::MAX);
    }
}
