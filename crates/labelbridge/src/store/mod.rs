//! Persistence for the three tables the bridge owns: per-tenant sync state,
//! label mappings, and the outbound emission audit trail.
//!
//! Every store is a trait with a Postgres backend ([`postgres`]) and an
//! in-memory backend ([`memory`]) used by tests and embedded setups.

pub mod memory;
pub mod postgres;

use crate::error::BridgeError;
use crate::mapper::{LabelMapping, MappingDirection};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-tenant poll progress over the labeler's event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    pub tenant_id: String,
    /// Opaque cursor from the labeler; `None` before the first successful poll.
    pub last_synced_cursor: Option<String>,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub sync_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update for [`SyncState`]; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStateUpdate {
    pub last_synced_cursor: Option<String>,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub sync_enabled: Option<bool>,
}

/// Cursor and enablement persistence, one row per tenant.
#[async_trait]
pub trait SyncStateStore: Send + Sync {
    async fn get(&self, tenant_id: &str) -> Result<Option<SyncState>, BridgeError>;

    /// Insert-or-update: missing rows are created with defaults (enabled,
    /// no cursor); existing rows only change the fields the update carries.
    /// `updated_at` always bumps.
    async fn upsert(
        &self,
        tenant_id: &str,
        update: SyncStateUpdate,
    ) -> Result<SyncState, BridgeError>;

    async fn list_enabled_tenants(&self) -> Result<Vec<String>, BridgeError>;
}

/// A stored label mapping row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelMappingRecord {
    pub id: Uuid,
    pub tenant_id: String,
    pub policy_type: String,
    pub label_value: String,
    pub direction: MappingDirection,
    pub created_at: DateTime<Utc>,
}

impl LabelMappingRecord {
    /// Strip storage identity, leaving the translation rule.
    pub fn mapping(&self) -> LabelMapping {
        LabelMapping {
            policy_type: self.policy_type.clone(),
            label_value: self.label_value.clone(),
            direction: self.direction,
        }
    }
}

/// Per-tenant mapping rows, unique on `(tenant, policy_type, label_value)`.
#[async_trait]
pub trait MappingStore: Send + Sync {
    async fn list(&self, tenant_id: &str) -> Result<Vec<LabelMappingRecord>, BridgeError>;

    /// Insert a row, or update `direction` only when the identity already
    /// exists.
    async fn upsert(
        &self,
        tenant_id: &str,
        mapping: LabelMapping,
    ) -> Result<LabelMappingRecord, BridgeError>;

    /// Remove one row; returns whether anything was deleted.
    async fn delete(
        &self,
        tenant_id: &str,
        policy_type: &str,
        label_value: &str,
    ) -> Result<bool, BridgeError>;
}

/// Status of one outbound emission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmissionStatus {
    Pending,
    Success,
    RetryableError,
}

impl EmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Success => "SUCCESS",
            Self::RetryableError => "RETRYABLE_ERROR",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "SUCCESS" => Some(Self::Success),
            "RETRYABLE_ERROR" => Some(Self::RetryableError),
            _ => None,
        }
    }
}

/// Request-side fields of an emission attempt, captured before the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmittedEvent {
    pub tenant_id: String,
    pub event_type: String,
    pub subject_did: Option<String>,
    pub subject_uri: Option<String>,
    pub platform_action_id: Option<String>,
    pub platform_correlation_id: Option<String>,
}

/// One audit row: an emission attempt and its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmittedEventRecord {
    pub id: Uuid,
    pub tenant_id: String,
    pub event_type: String,
    pub subject_did: Option<String>,
    pub subject_uri: Option<String>,
    pub platform_action_id: Option<String>,
    pub platform_correlation_id: Option<String>,
    pub external_response: Option<serde_json::Value>,
    pub status: EmissionStatus,
    pub error: Option<String>,
    pub retry_count: i32,
    pub created_at: DateTime<Utc>,
}

/// Append-then-update audit trail for outbound emissions. Rows are never
/// deleted by the bridge; `RETRYABLE_ERROR` rows are the reconciliation
/// anchor for an external retry scheduler.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Insert a `PENDING` row and return its generated id. Must be called
    /// (and be durable) before the remote call begins.
    async fn insert_pending(&self, event: NewEmittedEvent) -> Result<Uuid, BridgeError>;

    /// Terminal transition on HTTP success. Last write wins.
    async fn mark_success(
        &self,
        id: Uuid,
        response: serde_json::Value,
    ) -> Result<(), BridgeError>;

    /// Terminal transition on failure. Last write wins.
    async fn mark_retryable(&self, id: Uuid, error: &str) -> Result<(), BridgeError>;

    async fn get(&self, id: Uuid) -> Result<Option<EmittedEventRecord>, BridgeError>;

    /// Rows for a tenant in a given status, oldest first. Backed by the
    /// `(tenant_id, status)` index; this is the reconciler's entry point.
    async fn list_by_status(
        &self,
        tenant_id: &str,
        status: EmissionStatus,
    ) -> Result<Vec<EmittedEventRecord>, BridgeError>;
}
