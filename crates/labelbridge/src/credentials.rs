//! Read-through adapter over the platform's credential store.
//!
//! The credential store itself belongs to another team; the bridge only ever
//! reads the `EXTERNAL_LABELER` credential kind, one record per tenant. No
//! caching is assumed: callers tolerate repeated lookups, and the file
//! backend re-reads on every call so rotations take effect without a restart.

use crate::error::BridgeError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use url::Url;

/// The credential kind this adapter reads from the platform store.
pub const CREDENTIAL_KIND: &str = "EXTERNAL_LABELER";

/// Per-tenant connection material for a self-hosted labeler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelerCredential {
    pub tenant_id: String,
    /// Base URL of the labeler service.
    pub service_url: Url,
    /// DID of the platform's service account on this labeler.
    pub did: String,
    /// Raw secp256k1 private scalar, hex-encoded (optionally `0x`-prefixed).
    pub signing_key_hex: String,
    /// Human label; unused by the bridge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
}

/// Pluggable source of labeler credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fetch the labeler credential for a tenant. `None` means the tenant is
    /// not configured for the external labeler, which is a normal condition.
    async fn get(&self, tenant_id: &str) -> Result<Option<LabelerCredential>, BridgeError>;
}

/// In-memory credential store for tests and embedded setups.
#[derive(Clone, Default)]
pub struct MemoryCredentialStore(Arc<RwLock<HashMap<String, LabelerCredential>>>);

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a tenant's credential.
    pub async fn insert(&self, credential: LabelerCredential) {
        self.0
            .write()
            .await
            .insert(credential.tenant_id.clone(), credential);
    }

    pub async fn remove(&self, tenant_id: &str) {
        self.0.write().await.remove(tenant_id);
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, tenant_id: &str) -> Result<Option<LabelerCredential>, BridgeError> {
        Ok(self.0.read().await.get(tenant_id).cloned())
    }
}

/// File-backed credential store: a JSON map of tenant id to credential.
///
/// NOT a secrets manager; suitable for development and single-box
/// deployments where the file carries filesystem permissions.
#[derive(Clone, Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_owned(),
        }
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get(&self, tenant_id: &str) -> Result<Option<LabelerCredential>, BridgeError> {
        let file = std::fs::read_to_string(&self.path).map_err(BridgeError::persistence)?;
        let mut map: HashMap<String, LabelerCredential> =
            serde_json::from_str(&file).map_err(BridgeError::persistence)?;
        Ok(map.remove(tenant_id))
    }
}
