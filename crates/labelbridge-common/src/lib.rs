//! # labelbridge-common
//!
//! Shared client-side plumbing for talking to self-hosted Ozone labelers:
//!
//! - a minimal [`http_client::HttpClient`] abstraction (implemented for
//!   `reqwest::Client`) so protocol code stays testable without a network,
//! - stateless XRPC request building and response mapping ([`xrpc`]),
//! - the client error taxonomy ([`error`]),
//! - service-auth JWT material ([`service_auth`]): PKCS8 wrapping of a raw
//!   secp256k1 scalar, ES256K signing, and verification helpers.

#![warn(missing_docs)]

pub mod error;
pub mod http_client;
pub mod service_auth;
pub mod xrpc;

pub use error::{ClientError, DecodeError, EncodeError, HttpError, TransportError, XrpcResult};
pub use http_client::HttpClient;
pub use xrpc::{XrpcCall, XrpcExt, XrpcMethod, XrpcRequest};
