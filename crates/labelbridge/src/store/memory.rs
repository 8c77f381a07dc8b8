//! In-memory stores for tests and embedded setups.

use super::{
    AuditStore, EmissionStatus, EmittedEventRecord, LabelMappingRecord, MappingStore,
    NewEmittedEvent, SyncState, SyncStateStore, SyncStateUpdate,
};
use crate::error::BridgeError;
use crate::mapper::LabelMapping;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory [`SyncStateStore`].
#[derive(Clone, Default)]
pub struct MemorySyncStateStore(Arc<RwLock<HashMap<String, SyncState>>>);

impl MemorySyncStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SyncStateStore for MemorySyncStateStore {
    async fn get(&self, tenant_id: &str) -> Result<Option<SyncState>, BridgeError> {
        Ok(self.0.read().await.get(tenant_id).cloned())
    }

    async fn upsert(
        &self,
        tenant_id: &str,
        update: SyncStateUpdate,
    ) -> Result<SyncState, BridgeError> {
        let mut map = self.0.write().await;
        let now = Utc::now();
        let state = map
            .entry(tenant_id.to_owned())
            .or_insert_with(|| SyncState {
                tenant_id: tenant_id.to_owned(),
                last_synced_cursor: None,
                last_synced_at: None,
                sync_enabled: true,
                created_at: now,
                updated_at: now,
            });
        if let Some(cursor) = update.last_synced_cursor {
            state.last_synced_cursor = Some(cursor);
        }
        if let Some(synced_at) = update.last_synced_at {
            state.last_synced_at = Some(synced_at);
        }
        if let Some(enabled) = update.sync_enabled {
            state.sync_enabled = enabled;
        }
        state.updated_at = now;
        Ok(state.clone())
    }

    async fn list_enabled_tenants(&self) -> Result<Vec<String>, BridgeError> {
        let mut tenants: Vec<String> = self
            .0
            .read()
            .await
            .values()
            .filter(|s| s.sync_enabled)
            .map(|s| s.tenant_id.clone())
            .collect();
        tenants.sort();
        Ok(tenants)
    }
}

/// In-memory [`MappingStore`].
#[derive(Clone, Default)]
pub struct MemoryMappingStore(Arc<RwLock<Vec<LabelMappingRecord>>>);

impl MemoryMappingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MappingStore for MemoryMappingStore {
    async fn list(&self, tenant_id: &str) -> Result<Vec<LabelMappingRecord>, BridgeError> {
        Ok(self
            .0
            .read()
            .await
            .iter()
            .filter(|r| r.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    async fn upsert(
        &self,
        tenant_id: &str,
        mapping: LabelMapping,
    ) -> Result<LabelMappingRecord, BridgeError> {
        let mut rows = self.0.write().await;
        if let Some(existing) = rows.iter_mut().find(|r| {
            r.tenant_id == tenant_id
                && r.policy_type == mapping.policy_type
                && r.label_value == mapping.label_value
        }) {
            existing.direction = mapping.direction;
            return Ok(existing.clone());
        }
        let record = LabelMappingRecord {
            id: Uuid::new_v4(),
            tenant_id: tenant_id.to_owned(),
            policy_type: mapping.policy_type,
            label_value: mapping.label_value,
            direction: mapping.direction,
            created_at: Utc::now(),
        };
        rows.push(record.clone());
        Ok(record)
    }

    async fn delete(
        &self,
        tenant_id: &str,
        policy_type: &str,
        label_value: &str,
    ) -> Result<bool, BridgeError> {
        let mut rows = self.0.write().await;
        let before = rows.len();
        rows.retain(|r| {
            !(r.tenant_id == tenant_id
                && r.policy_type == policy_type
                && r.label_value == label_value)
        });
        Ok(rows.len() < before)
    }
}

/// In-memory [`AuditStore`].
#[derive(Clone, Default)]
pub struct MemoryAuditStore(Arc<RwLock<HashMap<Uuid, EmittedEventRecord>>>);

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All rows, oldest first. Test helper.
    pub async fn all(&self) -> Vec<EmittedEventRecord> {
        let mut rows: Vec<EmittedEventRecord> = self.0.read().await.values().cloned().collect();
        rows.sort_by_key(|r| r.created_at);
        rows
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn insert_pending(&self, event: NewEmittedEvent) -> Result<Uuid, BridgeError> {
        let id = Uuid::new_v4();
        let record = EmittedEventRecord {
            id,
            tenant_id: event.tenant_id,
            event_type: event.event_type,
            subject_did: event.subject_did,
            subject_uri: event.subject_uri,
            platform_action_id: event.platform_action_id,
            platform_correlation_id: event.platform_correlation_id,
            external_response: None,
            status: EmissionStatus::Pending,
            error: None,
            retry_count: 0,
            created_at: Utc::now(),
        };
        self.0.write().await.insert(id, record);
        Ok(id)
    }

    async fn mark_success(
        &self,
        id: Uuid,
        response: serde_json::Value,
    ) -> Result<(), BridgeError> {
        if let Some(record) = self.0.write().await.get_mut(&id) {
            record.status = EmissionStatus::Success;
            record.external_response = Some(response);
            record.error = None;
        }
        Ok(())
    }

    async fn mark_retryable(&self, id: Uuid, error: &str) -> Result<(), BridgeError> {
        if let Some(record) = self.0.write().await.get_mut(&id) {
            record.status = EmissionStatus::RetryableError;
            record.error = Some(error.to_owned());
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<EmittedEventRecord>, BridgeError> {
        Ok(self.0.read().await.get(&id).cloned())
    }

    async fn list_by_status(
        &self,
        tenant_id: &str,
        status: EmissionStatus,
    ) -> Result<Vec<EmittedEventRecord>, BridgeError> {
        let mut rows: Vec<EmittedEventRecord> = self
            .0
            .read()
            .await
            .values()
            .filter(|r| r.tenant_id == tenant_id && r.status == status)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.created_at);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::MappingDirection;

    #[tokio::test]
    async fn sync_state_upsert_creates_then_patches() {
        let store = MemorySyncStateStore::new();
        assert!(store.get("t1").await.unwrap().is_none());

        let created = store
            .upsert("t1", SyncStateUpdate::default())
            .await
            .unwrap();
        assert!(created.sync_enabled);
        assert!(created.last_synced_cursor.is_none());

        let advanced = store
            .upsert(
                "t1",
                SyncStateUpdate {
                    last_synced_cursor: Some("10".into()),
                    last_synced_at: Some(Utc::now()),
                    sync_enabled: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(advanced.last_synced_cursor.as_deref(), Some("10"));
        assert!(advanced.sync_enabled);

        // A patch that carries no cursor leaves the stored cursor alone.
        let disabled = store
            .upsert(
                "t1",
                SyncStateUpdate {
                    sync_enabled: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(disabled.last_synced_cursor.as_deref(), Some("10"));
        assert!(!disabled.sync_enabled);
    }

    #[tokio::test]
    async fn enabled_tenant_listing_excludes_disabled() {
        let store = MemorySyncStateStore::new();
        store.upsert("b", SyncStateUpdate::default()).await.unwrap();
        store.upsert("a", SyncStateUpdate::default()).await.unwrap();
        store
            .upsert(
                "c",
                SyncStateUpdate {
                    sync_enabled: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(
            store.list_enabled_tenants().await.unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[tokio::test]
    async fn mapping_upsert_on_conflict_updates_direction_only() {
        let store = MemoryMappingStore::new();
        let first = store
            .upsert(
                "t1",
                LabelMapping::new("SPAM", "x-spam", MappingDirection::Both),
            )
            .await
            .unwrap();

        let second = store
            .upsert(
                "t1",
                LabelMapping::new("SPAM", "x-spam", MappingDirection::Inbound),
            )
            .await
            .unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.direction, MappingDirection::Inbound);
        assert_eq!(store.list("t1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn mapping_delete_is_scoped_to_identity() {
        let store = MemoryMappingStore::new();
        store
            .upsert(
                "t1",
                LabelMapping::new("SPAM", "x-spam", MappingDirection::Both),
            )
            .await
            .unwrap();

        assert!(!store.delete("t1", "SPAM", "other").await.unwrap());
        assert!(!store.delete("t2", "SPAM", "x-spam").await.unwrap());
        assert!(store.delete("t1", "SPAM", "x-spam").await.unwrap());
        assert!(store.list("t1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn audit_rows_transition_to_terminal_states() {
        let store = MemoryAuditStore::new();
        let event = NewEmittedEvent {
            tenant_id: "t1".into(),
            event_type: "label".into(),
            subject_did: Some("did:plc:a".into()),
            subject_uri: None,
            platform_action_id: Some("act-1".into()),
            platform_correlation_id: None,
        };

        let ok_id = store.insert_pending(event.clone()).await.unwrap();
        assert_eq!(
            store.get(ok_id).await.unwrap().unwrap().status,
            EmissionStatus::Pending
        );
        store
            .mark_success(ok_id, serde_json::json!({"id": 1}))
            .await
            .unwrap();
        let ok_row = store.get(ok_id).await.unwrap().unwrap();
        assert_eq!(ok_row.status, EmissionStatus::Success);
        assert!(ok_row.external_response.is_some());

        let failed_id = store.insert_pending(event).await.unwrap();
        store.mark_retryable(failed_id, "HTTP 500").await.unwrap();
        let failed_row = store.get(failed_id).await.unwrap().unwrap();
        assert_eq!(failed_row.status, EmissionStatus::RetryableError);
        assert_eq!(failed_row.error.as_deref(), Some("HTTP 500"));

        assert_eq!(
            store
                .list_by_status("t1", EmissionStatus::RetryableError)
                .await
                .unwrap()
                .len(),
            1
        );
    }
}
