//! Seam to the platform's review queue.
//!
//! Enqueueing is fire-and-forget from the bridge's perspective; failures
//! bubble to the poller, which logs and moves to the next event.

use crate::error::BridgeError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Source marker stamped on every item the bridge enqueues.
pub const REVIEW_SOURCE: &str = "EXTERNAL_LABELER";

/// One unit of work for human review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQueueItem {
    pub tenant_id: String,
    /// The classified event plus the raw labeler event, so downstream tooling
    /// can re-derive anything the classifier dropped.
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub source: String,
    pub correlation_id: Option<String>,
    pub policy_ids: Vec<String>,
}

/// Review-queue collaborator contract.
#[async_trait]
pub trait ReviewQueue: Send + Sync {
    async fn enqueue(&self, item: ReviewQueueItem) -> Result<(), BridgeError>;
}

/// Recording queue for tests.
#[derive(Clone, Default)]
pub struct RecordingReviewQueue(Arc<RwLock<Vec<ReviewQueueItem>>>);

impl RecordingReviewQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn items(&self) -> Vec<ReviewQueueItem> {
        self.0.read().await.clone()
    }
}

#[async_trait]
impl ReviewQueue for RecordingReviewQueue {
    async fn enqueue(&self, item: ReviewQueueItem) -> Result<(), BridgeError> {
        self.0.write().await.push(item);
        Ok(())
    }
}

/// Queue stand-in that only logs. Used when the bridge runs without the
/// platform's queue service attached.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogReviewQueue;

#[async_trait]
impl ReviewQueue for LogReviewQueue {
    async fn enqueue(&self, item: ReviewQueueItem) -> Result<(), BridgeError> {
        tracing::info!(
            tenant_id = %item.tenant_id,
            correlation_id = ?item.correlation_id,
            "review-queue item (log only)"
        );
        Ok(())
    }
}
