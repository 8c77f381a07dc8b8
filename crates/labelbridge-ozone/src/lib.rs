//! # labelbridge-ozone
//!
//! Handwritten lexicon types for the slice of the `tools.ozone.moderation`
//! surface the bridge actually calls, plus the subject/event definitions they
//! reference. Outbound events are closed `$type`-tagged unions; inbound
//! events keep `$type` as a string because labelers are free to emit event
//! kinds this crate has never heard of.

pub mod defs;
pub mod emit_event;
pub mod health;
pub mod query_events;
pub mod query_statuses;

pub use defs::{
    ModEvent, ModEventAcknowledge, ModEventComment, ModEventData, ModEventEscalate,
    ModEventLabel, ModEventReverseTakedown, ModEventTakedown, ModEventView, RepoRef, StrongRef,
    SubjectRef,
};
pub use emit_event::{EmitEvent, EmitEventOutput};
pub use health::{HealthCheck, ServerHealth};
pub use query_events::{QueryEventsParams, QueryEventsOutput};
pub use query_statuses::{QueryStatusesParams, QueryStatusesOutput, SubjectStatusView};
