//! # labelbridge
//!
//! Bidirectional moderation-event bridge between the platform and each
//! tenant's self-hosted Ozone labeler.
//!
//! Outbound, the rule engine and human moderators emit moderation events
//! (label, takedown, reverse-takedown, comment, acknowledge, escalate)
//! through [`service::LabelerBridge::emit_event`]; every attempt leaves a
//! durable audit row that transitions `PENDING → SUCCESS | RETRYABLE_ERROR`.
//!
//! Inbound, the [`poller::PollSupervisor`] walks every sync-enabled tenant on
//! a fixed cadence, pages the labeler's event stream from the tenant's stored
//! cursor, classifies each event, and hands reports, labels, and escalations
//! to the review-queue collaborator.
//!
//! Outbound calls authenticate with a short-lived ES256K service JWT minted
//! from the tenant's secp256k1 signing key ([`token`]); label vocabulary is
//! translated both ways by the per-tenant [`mapper`] with a default table.

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod mapper;
pub mod poller;
pub mod review_queue;
pub mod service;
pub mod store;
pub mod token;

pub use error::BridgeError;
pub use service::{ClassifiedEvent, EmitParams, EmitEventType, LabelerBridge, PollOutcome, PolicyRef};
