//! The bridge façade: everything the platform calls, scoped by tenant.
//!
//! Composes the credential adapter, the per-tenant labeler client, the label
//! mapper, and the three stores. Outbound emission follows an
//! audit-first discipline: the `PENDING` row is durable before the network
//! call starts, and the terminal transition lands after it returns, so a
//! crash mid-call leaves a visible `PENDING` anchor instead of silence.

use crate::client::LabelerClient;
use crate::credentials::{CredentialStore, LabelerCredential};
use crate::error::BridgeError;
use crate::mapper::{self, EventCategory, LabelMapping};
use crate::store::{
    AuditStore, LabelMappingRecord, MappingStore, NewEmittedEvent, SyncState, SyncStateStore,
    SyncStateUpdate,
};
use chrono::Utc;
use labelbridge_common::http_client::HttpClient;
use labelbridge_ozone::defs::{
    ModEvent, ModEventAcknowledge, ModEventComment, ModEventEscalate, ModEventLabel,
    ModEventReverseTakedown, ModEventTakedown, ModEventView, SubjectRef,
};
use labelbridge_ozone::emit_event::EmitEvent;
use labelbridge_ozone::health::ServerHealth;
use labelbridge_ozone::query_events::QueryEventsParams;
use labelbridge_ozone::query_statuses::{QueryStatusesOutput, QueryStatusesParams};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::LazyLock;

/// Number of events requested per poll page.
const POLL_PAGE_SIZE: i64 = 100;

/// Extracts the DID authority out of an `at://` URI.
static AT_URI_DID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^at://(did:[^/]+)").expect("valid regex"));

/// Outbound moderation event kinds the platform can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EmitEventType {
    Label,
    Takedown,
    ReverseTakedown,
    Comment,
    Acknowledge,
    Escalate,
}

impl EmitEventType {
    /// Name recorded in the audit trail.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Label => "label",
            Self::Takedown => "takedown",
            Self::ReverseTakedown => "reverseTakedown",
            Self::Comment => "comment",
            Self::Acknowledge => "acknowledge",
            Self::Escalate => "escalate",
        }
    }
}

/// A platform policy referenced by an emission, for audit text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRef {
    pub id: String,
    pub name: String,
}

/// Everything needed to emit one moderation event to a tenant's labeler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmitParams {
    pub tenant_id: String,
    pub event_type: EmitEventType,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negate_labels: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub subject_did: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_uri: Option<String>,
    pub platform_action_id: String,
    pub platform_correlation_id: String,
    #[serde(default)]
    pub policies: Vec<PolicyRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_in_hours: Option<i64>,
}

/// Result of one poll over a tenant's event stream.
#[derive(Debug, Clone)]
pub struct PollOutcome {
    pub events: Vec<ModEventView>,
    pub new_cursor: Option<String>,
}

impl PollOutcome {
    fn empty() -> Self {
        PollOutcome {
            events: Vec::new(),
            new_cursor: None,
        }
    }
}

/// Bridge-internal normalization of an inbound labeler event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedEvent {
    pub category: Option<EventCategory>,
    pub labels: Vec<String>,
    pub comment: Option<String>,
    pub subject_did: Option<String>,
    pub subject_uri: Option<String>,
}

/// Normalize an inbound labeler event: category, labels, comment, subject.
pub fn classify_event(event: &ModEventView) -> ClassifiedEvent {
    let (subject_did, subject_uri) = match &event.subject {
        SubjectRef::Repo(repo) => (Some(repo.did.clone()), None),
        SubjectRef::Record(record) => {
            let did = AT_URI_DID
                .captures(&record.uri)
                .map(|c| c[1].to_owned());
            (did, Some(record.uri.clone()))
        }
        SubjectRef::Unknown => (None, None),
    };

    ClassifiedEvent {
        category: mapper::classify_event_type(&event.event.kind),
        labels: event.event.create_label_vals.clone().unwrap_or_default(),
        comment: event.event.comment.clone(),
        subject_did,
        subject_uri,
    }
}

/// Tenant-scoped façade over the whole bridge.
pub struct LabelerBridge<C: HttpClient + Clone> {
    http: C,
    credentials: Arc<dyn CredentialStore>,
    sync_state: Arc<dyn SyncStateStore>,
    mappings: Arc<dyn MappingStore>,
    audit: Arc<dyn AuditStore>,
}

impl<C: HttpClient + Clone> LabelerBridge<C> {
    pub fn new(
        http: C,
        credentials: Arc<dyn CredentialStore>,
        sync_state: Arc<dyn SyncStateStore>,
        mappings: Arc<dyn MappingStore>,
        audit: Arc<dyn AuditStore>,
    ) -> Self {
        Self {
            http,
            credentials,
            sync_state,
            mappings,
            audit,
        }
    }

    async fn require_credential(&self, tenant_id: &str) -> Result<LabelerCredential, BridgeError> {
        self.credentials
            .get(tenant_id)
            .await?
            .ok_or_else(|| BridgeError::NotConfigured {
                tenant_id: tenant_id.to_owned(),
            })
    }

    fn client_for(&self, credential: LabelerCredential) -> LabelerClient<C> {
        LabelerClient::new(self.http.clone(), credential)
    }

    /// Whether a tenant has a labeler credential.
    pub async fn is_configured(&self, tenant_id: &str) -> Result<bool, BridgeError> {
        Ok(self.credentials.get(tenant_id).await?.is_some())
    }

    /// Tenants with sync enabled, in stable order.
    pub async fn list_enabled_tenants(&self) -> Result<Vec<String>, BridgeError> {
        self.sync_state.list_enabled_tenants().await
    }

    /// Emit a moderation event to the tenant's labeler, with a durable audit
    /// record of the attempt.
    ///
    /// The audit row is inserted `PENDING` before the call and transitioned
    /// afterwards; on failure the error is recorded and re-raised.
    pub async fn emit_event(&self, params: EmitParams) -> Result<(), BridgeError> {
        let credential = self.require_credential(&params.tenant_id).await?;

        // Comment events carry the caller's text verbatim (empty when
        // absent); every other kind falls back to a policy summary.
        let fallback_comment = || {
            params.comment.clone().unwrap_or_else(|| {
                format!(
                    "Platform moderation action: {}",
                    params
                        .policies
                        .iter()
                        .map(|p| p.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
        };

        let event = match params.event_type {
            EmitEventType::Label => ModEvent::Label(ModEventLabel {
                create_label_vals: params.labels.clone(),
                negate_label_vals: params.negate_labels.clone().unwrap_or_default(),
                comment: Some(fallback_comment()),
            }),
            EmitEventType::Takedown => ModEvent::Takedown(ModEventTakedown {
                comment: Some(fallback_comment()),
                duration_in_hours: params.duration_in_hours,
            }),
            EmitEventType::ReverseTakedown => {
                ModEvent::ReverseTakedown(ModEventReverseTakedown {
                    comment: Some(fallback_comment()),
                })
            }
            EmitEventType::Comment => ModEvent::Comment(ModEventComment {
                comment: params.comment.clone().unwrap_or_default(),
                sticky: false,
            }),
            EmitEventType::Acknowledge => ModEvent::Acknowledge(ModEventAcknowledge {
                comment: Some(fallback_comment()),
            }),
            EmitEventType::Escalate => ModEvent::Escalate(ModEventEscalate {
                comment: Some(fallback_comment()),
            }),
        };

        // The labeler accepts an empty CID for non-content subjects.
        let subject = match &params.subject_uri {
            Some(uri) => SubjectRef::record(uri.clone(), ""),
            None => SubjectRef::repo(params.subject_did.clone()),
        };

        let input = EmitEvent {
            event,
            subject,
            subject_blob_cids: None,
            created_by: credential.did.clone(),
        };

        let audit_id = self
            .audit
            .insert_pending(NewEmittedEvent {
                tenant_id: params.tenant_id.clone(),
                event_type: params.event_type.as_str().to_owned(),
                subject_did: Some(params.subject_did.clone()),
                subject_uri: params.subject_uri.clone(),
                platform_action_id: Some(params.platform_action_id.clone()),
                platform_correlation_id: Some(params.platform_correlation_id.clone()),
            })
            .await?;

        match self.client_for(credential).emit_event(&input).await {
            Ok(output) => {
                let response = serde_json::to_value(&output)
                    .unwrap_or_else(|_| serde_json::Value::Null);
                self.audit.mark_success(audit_id, response).await?;
                tracing::debug!(
                    tenant_id = %params.tenant_id,
                    event_type = params.event_type.as_str(),
                    external_id = output.id,
                    "moderation event emitted"
                );
                Ok(())
            }
            Err(err) => {
                if let Err(mark_err) = self.audit.mark_retryable(audit_id, &err.to_string()).await
                {
                    tracing::error!(
                        tenant_id = %params.tenant_id,
                        error = %mark_err,
                        "failed to record emission failure"
                    );
                }
                Err(err)
            }
        }
    }

    /// Poll the tenant's event stream from the stored cursor.
    ///
    /// An unconfigured tenant and a tenant with sync disabled both return an
    /// empty outcome. The stored cursor only ever advances to a cursor the
    /// labeler returned.
    pub async fn poll_events(&self, tenant_id: &str) -> Result<PollOutcome, BridgeError> {
        let Some(credential) = self.credentials.get(tenant_id).await? else {
            return Ok(PollOutcome::empty());
        };
        let Some(state) = self.sync_state.get(tenant_id).await? else {
            return Ok(PollOutcome::empty());
        };
        if !state.sync_enabled {
            return Ok(PollOutcome::empty());
        }

        let params = QueryEventsParams {
            cursor: state.last_synced_cursor.clone(),
            limit: Some(POLL_PAGE_SIZE),
            sort_direction: Some("asc".to_owned()),
            ..Default::default()
        };
        let output = self.client_for(credential).query_events(&params).await?;

        if let Some(cursor) = &output.cursor {
            self.sync_state
                .upsert(
                    tenant_id,
                    SyncStateUpdate {
                        last_synced_cursor: Some(cursor.clone()),
                        last_synced_at: Some(Utc::now()),
                        sync_enabled: None,
                    },
                )
                .await?;
        }

        Ok(PollOutcome {
            events: output.events,
            new_cursor: output.cursor,
        })
    }

    /// Normalize an inbound labeler event. Pure; see [`classify_event`].
    pub fn classify_event(&self, event: &ModEventView) -> ClassifiedEvent {
        classify_event(event)
    }

    /// Translate labeler labels into platform policy types using the
    /// tenant's effective table.
    pub async fn map_labels_to_policies(
        &self,
        tenant_id: &str,
        labels: &[String],
    ) -> Result<Vec<String>, BridgeError> {
        let tenant_mappings = self.tenant_mappings(tenant_id).await?;
        Ok(mapper::labels_to_policies(
            mapper::effective_mappings(&tenant_mappings),
            labels,
        ))
    }

    /// Translate a platform policy type into labeler labels using the
    /// tenant's effective table.
    pub async fn map_policy_to_labels(
        &self,
        tenant_id: &str,
        policy_type: &str,
    ) -> Result<Vec<String>, BridgeError> {
        let tenant_mappings = self.tenant_mappings(tenant_id).await?;
        Ok(mapper::policy_to_labels(
            mapper::effective_mappings(&tenant_mappings),
            policy_type,
        ))
    }

    async fn tenant_mappings(&self, tenant_id: &str) -> Result<Vec<LabelMapping>, BridgeError> {
        let rows = self.mappings.list(tenant_id).await?;
        Ok(rows.iter().map(LabelMappingRecord::mapping).collect())
    }

    /// The tenant's stored mapping rows (not the default table).
    pub async fn list_mappings(
        &self,
        tenant_id: &str,
    ) -> Result<Vec<LabelMappingRecord>, BridgeError> {
        self.mappings.list(tenant_id).await
    }

    /// Create or re-point one mapping row.
    pub async fn upsert_mapping(
        &self,
        tenant_id: &str,
        mapping: LabelMapping,
    ) -> Result<LabelMappingRecord, BridgeError> {
        self.mappings.upsert(tenant_id, mapping).await
    }

    /// Delete one mapping row; returns whether anything was removed.
    pub async fn delete_mapping(
        &self,
        tenant_id: &str,
        policy_type: &str,
        label_value: &str,
    ) -> Result<bool, BridgeError> {
        self.mappings.delete(tenant_id, policy_type, label_value).await
    }

    /// The tenant's sync state, if any.
    pub async fn get_sync_state(&self, tenant_id: &str) -> Result<Option<SyncState>, BridgeError> {
        self.sync_state.get(tenant_id).await
    }

    /// Patch the tenant's sync state (enable/disable polling, set cursor).
    pub async fn update_sync_state(
        &self,
        tenant_id: &str,
        update: SyncStateUpdate,
    ) -> Result<SyncState, BridgeError> {
        self.sync_state.upsert(tenant_id, update).await
    }

    /// Tenant-scoped passthrough to `queryStatuses`.
    pub async fn query_statuses(
        &self,
        tenant_id: &str,
        params: &QueryStatusesParams,
    ) -> Result<QueryStatusesOutput, BridgeError> {
        let credential = self.require_credential(tenant_id).await?;
        self.client_for(credential).query_statuses(params).await
    }

    /// Probe the tenant's labeler.
    pub async fn check_health(&self, tenant_id: &str) -> Result<ServerHealth, BridgeError> {
        let credential = self.require_credential(tenant_id).await?;
        self.client_for(credential).health().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use labelbridge_ozone::defs::ModEventData;

    fn event(kind: &str, subject: SubjectRef) -> ModEventView {
        ModEventView {
            id: 7,
            event: ModEventData {
                kind: kind.to_owned(),
                ..Default::default()
            },
            subject,
            subject_blob_cids: None,
            created_by: "did:plc:labeler".to_owned(),
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn classify_extracts_did_from_record_uri() {
        let view = event(
            "tools.ozone.moderation.defs#modEventReport",
            SubjectRef::record("at://did:plc:c/app.bsky.feed.post/2", ""),
        );
        let classified = classify_event(&view);
        assert_eq!(classified.category, Some(EventCategory::Report));
        assert_eq!(classified.subject_did.as_deref(), Some("did:plc:c"));
        assert_eq!(
            classified.subject_uri.as_deref(),
            Some("at://did:plc:c/app.bsky.feed.post/2")
        );
        assert!(classified.labels.is_empty());
    }

    #[test]
    fn classify_uses_repo_did_directly() {
        let view = event(
            "tools.ozone.moderation.defs#modEventTakedown",
            SubjectRef::repo("did:plc:b"),
        );
        let classified = classify_event(&view);
        assert_eq!(classified.category, Some(EventCategory::Takedown));
        assert_eq!(classified.subject_did.as_deref(), Some("did:plc:b"));
        assert!(classified.subject_uri.is_none());
    }

    #[test]
    fn classify_tolerates_unparseable_uris_and_unknown_subjects() {
        let odd = event(
            "tools.ozone.moderation.defs#modEventLabel",
            SubjectRef::record("https://not-an-at-uri", ""),
        );
        let classified = classify_event(&odd);
        assert!(classified.subject_did.is_none());
        assert_eq!(classified.subject_uri.as_deref(), Some("https://not-an-at-uri"));

        let unknown = event("tools.ozone.moderation.defs#modEventLabel", SubjectRef::Unknown);
        let classified = classify_event(&unknown);
        assert!(classified.subject_did.is_none());
        assert!(classified.subject_uri.is_none());
    }

    #[test]
    fn classify_copies_labels_and_comment() {
        let mut view = event(
            "tools.ozone.moderation.defs#modEventLabel",
            SubjectRef::repo("did:plc:a"),
        );
        view.event.create_label_vals = Some(vec!["spam".into(), "rude".into()]);
        view.event.comment = Some("looks bad".into());

        let classified = classify_event(&view);
        assert_eq!(classified.labels, vec!["spam", "rude"]);
        assert_eq!(classified.comment.as_deref(), Some("looks bad"));
    }

    #[test]
    fn unrecognized_kinds_classify_as_none() {
        let view = event(
            "tools.ozone.moderation.defs#modEventMute",
            SubjectRef::repo("did:plc:a"),
        );
        assert_eq!(classify_event(&view).category, None);
    }
}
