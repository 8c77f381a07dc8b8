//! Bridge error taxonomy.
//!
//! Everything the bridge surfaces collapses into [`BridgeError`]. Client-side
//! errors from the protocol layer are re-sorted into the variants callers
//! actually branch on: a non-2xx labeler response, a transport failure, and a
//! response that would not parse are distinct conditions with distinct
//! handling (the first two mark audit rows retryable; the last one usually
//! means a labeler version mismatch worth paging about).

use labelbridge_common::error::{ClientError, DecodeError, EncodeError, HttpError, TransportError};

/// Errors surfaced by the bridge façade and its collaborator adapters.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum BridgeError {
    /// Tenant has no labeler credential configured.
    #[error("tenant {tenant_id} has no labeler credential configured")]
    NotConfigured {
        /// The tenant that is missing a credential.
        tenant_id: String,
    },

    /// The tenant's signing key or service URL failed validation.
    #[error("invalid labeler credential: {0}")]
    InvalidCredential(String),

    /// The labeler answered with a non-2xx status.
    #[error("{0}")]
    Http(#[from] HttpError),

    /// The labeler could not be reached (connect, timeout, DNS, TLS).
    #[error("labeler transport failure: {0}")]
    Transport(#[from] TransportError),

    /// The labeler answered 2xx but the body did not match the lexicon.
    #[error("malformed labeler response: {0}")]
    MalformedResponse(#[from] DecodeError),

    /// A request could not be serialized.
    #[error("failed to encode request: {0}")]
    Encode(#[from] EncodeError),

    /// A database or credential-store operation failed.
    #[error("persistence failure: {0}")]
    Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl BridgeError {
    /// Wrap any storage-layer failure.
    pub fn persistence(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        BridgeError::Persistence(err.into())
    }
}

impl From<ClientError> for BridgeError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Transport(e) => BridgeError::Transport(e),
            ClientError::Encode(e) => BridgeError::Encode(e),
            ClientError::Decode(e) => BridgeError::MalformedResponse(e),
            ClientError::Http(e) => BridgeError::Http(e),
        }
    }
}

impl From<sqlx::Error> for BridgeError {
    fn from(err: sqlx::Error) -> Self {
        BridgeError::Persistence(Box::new(err))
    }
}
