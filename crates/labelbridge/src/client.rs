//! Stateless protocol client for one tenant's labeler.
//!
//! One instance per tenant credential. Every call mints a fresh bearer token
//! and is bounded by a per-call timeout, so a wedged labeler cannot stall a
//! polling cycle for longer than the timeout.

use crate::credentials::LabelerCredential;
use crate::error::BridgeError;
use crate::token;
use labelbridge_common::error::TransportError;
use labelbridge_common::http_client::HttpClient;
use labelbridge_common::xrpc::{XrpcExt, XrpcRequest};
use labelbridge_ozone::emit_event::{EmitEvent, EmitEventOutput};
use labelbridge_ozone::health::{HealthCheck, ServerHealth};
use labelbridge_ozone::query_events::{QueryEventsOutput, QueryEventsParams};
use labelbridge_ozone::query_statuses::{QueryStatusesOutput, QueryStatusesParams};
use std::time::Duration;

/// Timeout applied to every moderation call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout applied to the health check.
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// XRPC client over one tenant's labeler.
pub struct LabelerClient<C: HttpClient> {
    http: C,
    credential: LabelerCredential,
}

impl<C: HttpClient> LabelerClient<C> {
    pub fn new(http: C, credential: LabelerCredential) -> Self {
        Self { http, credential }
    }

    pub fn credential(&self) -> &LabelerCredential {
        &self.credential
    }

    async fn send_authed<R>(&self, request: &R, timeout: Duration) -> Result<R::Output, BridgeError>
    where
        R: XrpcRequest + Sync,
    {
        let bearer = token::mint(&self.credential)?;
        let call = self
            .http
            .xrpc(self.credential.service_url.clone())
            .auth_bearer(bearer);

        let output = tokio::time::timeout(timeout, call.send(request))
            .await
            .map_err(|_| TransportError::Timeout)??;
        Ok(output)
    }

    /// Page through the labeler's moderation event stream.
    pub async fn query_events(
        &self,
        params: &QueryEventsParams,
    ) -> Result<QueryEventsOutput, BridgeError> {
        self.send_authed(params, REQUEST_TIMEOUT).await
    }

    /// Apply a moderation event to a subject.
    pub async fn emit_event(&self, input: &EmitEvent) -> Result<EmitEventOutput, BridgeError> {
        self.send_authed(input, REQUEST_TIMEOUT).await
    }

    /// Query subject review statuses.
    pub async fn query_statuses(
        &self,
        params: &QueryStatusesParams,
    ) -> Result<QueryStatusesOutput, BridgeError> {
        self.send_authed(params, REQUEST_TIMEOUT).await
    }

    /// Liveness probe. Unauthenticated, short timeout.
    pub async fn health(&self) -> Result<ServerHealth, BridgeError> {
        let call = self.http.xrpc(self.credential.service_url.clone());
        let output = tokio::time::timeout(HEALTH_TIMEOUT, call.send(&HealthCheck {}))
            .await
            .map_err(|_| TransportError::Timeout)??;
        Ok(output)
    }
}
