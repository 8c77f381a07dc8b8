//! Postgres-backed stores.
//!
//! Queries are runtime-bound (`sqlx::query` / `query_as`); the schema is
//! embedded and idempotent so a fresh database bootstraps at startup.

use super::{
    AuditStore, EmissionStatus, EmittedEventRecord, LabelMappingRecord, MappingStore,
    NewEmittedEvent, SyncState, SyncStateStore, SyncStateUpdate,
};
use crate::error::BridgeError;
use crate::mapper::{LabelMapping, MappingDirection};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Owned tables. `event_sync_state` keys poll progress by tenant;
/// `label_mappings` carries the per-tenant translation table;
/// `emitted_events` is the append-then-update audit trail.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS event_sync_state (
    tenant_id TEXT PRIMARY KEY,
    last_synced_cursor TEXT,
    last_synced_at TIMESTAMPTZ,
    sync_enabled BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS label_mappings (
    id UUID PRIMARY KEY,
    tenant_id TEXT NOT NULL,
    policy_type TEXT NOT NULL,
    label_value TEXT NOT NULL,
    direction TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    UNIQUE (tenant_id, policy_type, label_value)
);

CREATE TABLE IF NOT EXISTS emitted_events (
    id UUID PRIMARY KEY,
    tenant_id TEXT NOT NULL,
    event_type TEXT NOT NULL,
    subject_did TEXT,
    subject_uri TEXT,
    platform_action_id TEXT,
    platform_correlation_id TEXT,
    external_response JSONB,
    status TEXT NOT NULL DEFAULT 'PENDING',
    error TEXT,
    retry_count INTEGER NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_emitted_events_tenant_status
    ON emitted_events (tenant_id, status);
"#;

/// Apply the embedded schema. Safe to run on every startup.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), BridgeError> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    Ok(())
}

#[derive(FromRow)]
struct SyncStateRow {
    tenant_id: String,
    last_synced_cursor: Option<String>,
    last_synced_at: Option<DateTime<Utc>>,
    sync_enabled: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SyncStateRow> for SyncState {
    fn from(row: SyncStateRow) -> Self {
        SyncState {
            tenant_id: row.tenant_id,
            last_synced_cursor: row.last_synced_cursor,
            last_synced_at: row.last_synced_at,
            sync_enabled: row.sync_enabled,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Sync-state store over `event_sync_state`.
#[derive(Clone)]
pub struct PgSyncStateStore {
    pool: PgPool,
}

impl PgSyncStateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SyncStateStore for PgSyncStateStore {
    async fn get(&self, tenant_id: &str) -> Result<Option<SyncState>, BridgeError> {
        let row: Option<SyncStateRow> = sqlx::query_as(
            r#"
            SELECT tenant_id, last_synced_cursor, last_synced_at, sync_enabled,
                   created_at, updated_at
            FROM event_sync_state
            WHERE tenant_id = $1
            "#,
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(SyncState::from))
    }

    async fn upsert(
        &self,
        tenant_id: &str,
        update: SyncStateUpdate,
    ) -> Result<SyncState, BridgeError> {
        let row: SyncStateRow = sqlx::query_as(
            r#"
            INSERT INTO event_sync_state
                (tenant_id, last_synced_cursor, last_synced_at, sync_enabled)
            VALUES ($1, $2, $3, COALESCE($4, TRUE))
            ON CONFLICT (tenant_id) DO UPDATE SET
                last_synced_cursor =
                    COALESCE($2, event_sync_state.last_synced_cursor),
                last_synced_at = COALESCE($3, event_sync_state.last_synced_at),
                sync_enabled = COALESCE($4, event_sync_state.sync_enabled),
                updated_at = NOW()
            RETURNING tenant_id, last_synced_cursor, last_synced_at,
                      sync_enabled, created_at, updated_at
            "#,
        )
        .bind(tenant_id)
        .bind(update.last_synced_cursor)
        .bind(update.last_synced_at)
        .bind(update.sync_enabled)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn list_enabled_tenants(&self) -> Result<Vec<String>, BridgeError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT tenant_id FROM event_sync_state
            WHERE sync_enabled
            ORDER BY tenant_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(t,)| t).collect())
    }
}

#[derive(FromRow)]
struct MappingRow {
    id: Uuid,
    tenant_id: String,
    policy_type: String,
    label_value: String,
    direction: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<MappingRow> for LabelMappingRecord {
    type Error = BridgeError;

    fn try_from(row: MappingRow) -> Result<Self, BridgeError> {
        let direction = MappingDirection::parse(&row.direction).ok_or_else(|| {
            BridgeError::persistence(format!("unknown mapping direction: {}", row.direction))
        })?;
        Ok(LabelMappingRecord {
            id: row.id,
            tenant_id: row.tenant_id,
            policy_type: row.policy_type,
            label_value: row.label_value,
            direction,
            created_at: row.created_at,
        })
    }
}

/// Mapping store over `label_mappings`.
#[derive(Clone)]
pub struct PgMappingStore {
    pool: PgPool,
}

impl PgMappingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MappingStore for PgMappingStore {
    async fn list(&self, tenant_id: &str) -> Result<Vec<LabelMappingRecord>, BridgeError> {
        let rows: Vec<MappingRow> = sqlx::query_as(
            r#"
            SELECT id, tenant_id, policy_type, label_value, direction, created_at
            FROM label_mappings
            WHERE tenant_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(LabelMappingRecord::try_from).collect()
    }

    async fn upsert(
        &self,
        tenant_id: &str,
        mapping: LabelMapping,
    ) -> Result<LabelMappingRecord, BridgeError> {
        let row: MappingRow = sqlx::query_as(
            r#"
            INSERT INTO label_mappings (id, tenant_id, policy_type, label_value, direction)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (tenant_id, policy_type, label_value)
                DO UPDATE SET direction = EXCLUDED.direction
            RETURNING id, tenant_id, policy_type, label_value, direction, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(tenant_id)
        .bind(&mapping.policy_type)
        .bind(&mapping.label_value)
        .bind(mapping.direction.as_str())
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn delete(
        &self,
        tenant_id: &str,
        policy_type: &str,
        label_value: &str,
    ) -> Result<bool, BridgeError> {
        let result = sqlx::query(
            r#"
            DELETE FROM label_mappings
            WHERE tenant_id = $1 AND policy_type = $2 AND label_value = $3
            "#,
        )
        .bind(tenant_id)
        .bind(policy_type)
        .bind(label_value)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(FromRow)]
struct EmittedEventRow {
    id: Uuid,
    tenant_id: String,
    event_type: String,
    subject_did: Option<String>,
    subject_uri: Option<String>,
    platform_action_id: Option<String>,
    platform_correlation_id: Option<String>,
    external_response: Option<serde_json::Value>,
    status: String,
    error: Option<String>,
    retry_count: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<EmittedEventRow> for EmittedEventRecord {
    type Error = BridgeError;

    fn try_from(row: EmittedEventRow) -> Result<Self, BridgeError> {
        let status = EmissionStatus::parse(&row.status).ok_or_else(|| {
            BridgeError::persistence(format!("unknown emission status: {}", row.status))
        })?;
        Ok(EmittedEventRecord {
            id: row.id,
            tenant_id: row.tenant_id,
            event_type: row.event_type,
            subject_did: row.subject_did,
            subject_uri: row.subject_uri,
            platform_action_id: row.platform_action_id,
            platform_correlation_id: row.platform_correlation_id,
            external_response: row.external_response,
            status,
            error: row.error,
            retry_count: row.retry_count,
            created_at: row.created_at,
        })
    }
}

/// Audit store over `emitted_events`.
#[derive(Clone)]
pub struct PgAuditStore {
    pool: PgPool,
}

impl PgAuditStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditStore for PgAuditStore {
    async fn insert_pending(&self, event: NewEmittedEvent) -> Result<Uuid, BridgeError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO emitted_events
                (id, tenant_id, event_type, subject_did, subject_uri,
                 platform_action_id, platform_correlation_id, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'PENDING')
            "#,
        )
        .bind(id)
        .bind(&event.tenant_id)
        .bind(&event.event_type)
        .bind(&event.subject_did)
        .bind(&event.subject_uri)
        .bind(&event.platform_action_id)
        .bind(&event.platform_correlation_id)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn mark_success(
        &self,
        id: Uuid,
        response: serde_json::Value,
    ) -> Result<(), BridgeError> {
        sqlx::query(
            r#"
            UPDATE emitted_events
            SET status = 'SUCCESS', external_response = $2, error = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(response)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_retryable(&self, id: Uuid, error: &str) -> Result<(), BridgeError> {
        sqlx::query(
            r#"
            UPDATE emitted_events
            SET status = 'RETRYABLE_ERROR', error = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<EmittedEventRecord>, BridgeError> {
        let row: Option<EmittedEventRow> = sqlx::query_as(
            r#"
            SELECT id, tenant_id, event_type, subject_did, subject_uri,
                   platform_action_id, platform_correlation_id,
                   external_response, status, error, retry_count, created_at
            FROM emitted_events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(EmittedEventRecord::try_from).transpose()
    }

    async fn list_by_status(
        &self,
        tenant_id: &str,
        status: EmissionStatus,
    ) -> Result<Vec<EmittedEventRecord>, BridgeError> {
        let rows: Vec<EmittedEventRow> = sqlx::query_as(
            r#"
            SELECT id, tenant_id, event_type, subject_did, subject_uri,
                   platform_action_id, platform_correlation_id,
                   external_response, status, error, retry_count, created_at
            FROM emitted_events
            WHERE tenant_id = $1 AND status = $2
            ORDER BY created_at
            "#,
        )
        .bind(tenant_id)
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(EmittedEventRecord::try_from).collect()
    }
}
