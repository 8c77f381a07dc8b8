//! Shared test harness: a queued mock HTTP client and a bridge wired to
//! in-memory stores.

#![allow(dead_code)]

use labelbridge::credentials::{LabelerCredential, MemoryCredentialStore};
use labelbridge::service::LabelerBridge;
use labelbridge::store::memory::{MemoryAuditStore, MemoryMappingStore, MemorySyncStateStore};
use labelbridge_common::http_client::HttpClient;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;
use url::Url;

/// Queued HTTP client: pops one canned response per call and records every
/// request for assertions.
#[derive(Clone, Default)]
pub struct MockClient {
    queue: Arc<Mutex<VecDeque<http::Response<Vec<u8>>>>>,
    log: Arc<Mutex<Vec<http::Request<Vec<u8>>>>>,
}

impl MockClient {
    pub async fn push(&self, status: u16, body: serde_json::Value) {
        let resp = http::Response::builder()
            .status(status)
            .body(serde_json::to_vec(&body).expect("serializable body"))
            .expect("valid response");
        self.queue.lock().await.push_back(resp);
    }

    pub async fn take_log(&self) -> Vec<http::Request<Vec<u8>>> {
        let mut log = self.log.lock().await;
        let out = std::mem::take(&mut *log);
        out
    }

    pub async fn request_count(&self) -> usize {
        self.log.lock().await.len()
    }
}

impl HttpClient for MockClient {
    type Error = std::convert::Infallible;

    fn send_http(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> impl std::future::Future<Output = Result<http::Response<Vec<u8>>, Self::Error>> + Send
    {
        let log = self.log.clone();
        let queue = self.queue.clone();
        async move {
            log.lock().await.push(request);
            Ok(queue.lock().await.pop_front().expect("no queued response"))
        }
    }
}

/// A bridge over in-memory stores plus handles to everything behind it.
pub struct Harness {
    pub http: MockClient,
    pub credentials: MemoryCredentialStore,
    pub sync_state: MemorySyncStateStore,
    pub mappings: MemoryMappingStore,
    pub audit: MemoryAuditStore,
    pub bridge: Arc<LabelerBridge<MockClient>>,
}

impl Harness {
    pub fn new() -> Self {
        let http = MockClient::default();
        let credentials = MemoryCredentialStore::new();
        let sync_state = MemorySyncStateStore::new();
        let mappings = MemoryMappingStore::new();
        let audit = MemoryAuditStore::new();
        let bridge = Arc::new(LabelerBridge::new(
            http.clone(),
            Arc::new(credentials.clone()),
            Arc::new(sync_state.clone()),
            Arc::new(mappings.clone()),
            Arc::new(audit.clone()),
        ));
        Harness {
            http,
            credentials,
            sync_state,
            mappings,
            audit,
            bridge,
        }
    }

    /// Register a tenant credential pointing at `https://labeler.example`.
    pub async fn add_tenant(&self, tenant_id: &str) {
        self.credentials.insert(credential(tenant_id)).await;
    }
}

pub fn credential(tenant_id: &str) -> LabelerCredential {
    LabelerCredential {
        tenant_id: tenant_id.to_owned(),
        service_url: Url::parse("https://labeler.example").unwrap(),
        did: "did:plc:service".to_owned(),
        signing_key_hex: "07".repeat(32),
        handle: None,
    }
}

/// A canned labeler event for `queryEvents` responses.
pub fn report_event(id: i64, uri: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "event": {
            "$type": "tools.ozone.moderation.defs#modEventReport",
            "reportType": "com.atproto.moderation.defs#reasonSpam",
            "comment": "reported content"
        },
        "subject": {
            "$type": "com.atproto.repo.strongRef",
            "uri": uri,
            "cid": "bafyexample"
        },
        "createdBy": "did:plc:reporter",
        "createdAt": "2025-06-01T12:00:00Z"
    })
}

/// A canned `emitEvent` success body echoing a label event.
pub fn emit_success_body(id: i64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "event": {
            "$type": "tools.ozone.moderation.defs#modEventLabel",
            "createLabelVals": ["spam"]
        },
        "subject": {
            "$type": "com.atproto.admin.defs#repoRef",
            "did": "did:plc:subject"
        },
        "createdBy": "did:plc:service",
        "createdAt": "2025-06-01T12:00:00Z"
    })
}
