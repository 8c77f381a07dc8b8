//! `_health` — the labeler's liveness endpoint.
//!
//! Not a lexicon method, but it lives under the same `/xrpc/` prefix, so it
//! rides the ordinary request builder. No authorization required.

use labelbridge_common::xrpc::{XrpcMethod, XrpcRequest};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct HealthCheck {}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServerHealth {
    pub version: Option<String>,
}

impl XrpcRequest for HealthCheck {
    const NSID: &'static str = "_health";
    const METHOD: XrpcMethod = XrpcMethod::Query;
    type Output = ServerHealth;
}
