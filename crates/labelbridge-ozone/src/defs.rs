//! Shared definitions: moderation events and subject references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reference to a whole repository (an account).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RepoRef {
    pub did: String,
}

/// Reference to a specific record revision.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StrongRef {
    pub uri: String,
    pub cid: String,
}

/// Subject of a moderation event: an account or a specific record.
///
/// Labelers may reference subject kinds beyond these two (chat messages,
/// for instance); those parse as [`SubjectRef::Unknown`] rather than failing
/// the surrounding event.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "$type")]
pub enum SubjectRef {
    #[serde(rename = "com.atproto.admin.defs#repoRef")]
    Repo(RepoRef),
    #[serde(rename = "com.atproto.repo.strongRef")]
    Record(StrongRef),
    #[serde(other)]
    Unknown,
}

impl SubjectRef {
    /// Build a record subject from an `at://` URI and CID.
    pub fn record(uri: impl Into<String>, cid: impl Into<String>) -> Self {
        SubjectRef::Record(StrongRef {
            uri: uri.into(),
            cid: cid.into(),
        })
    }

    /// Build an account subject from a DID.
    pub fn repo(did: impl Into<String>) -> Self {
        SubjectRef::Repo(RepoRef { did: did.into() })
    }
}

/// Apply and/or negate labels on a subject.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ModEventLabel {
    pub create_label_vals: Vec<String>,
    pub negate_label_vals: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Take a subject down.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ModEventTakedown {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_in_hours: Option<i64>,
}

/// Reverse a previous takedown.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ModEventReverseTakedown {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Moderator comment on a subject.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ModEventComment {
    pub comment: String,
    pub sticky: bool,
}

/// Acknowledge a subject without further action.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ModEventAcknowledge {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Escalate a subject for senior review.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ModEventEscalate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Outbound moderation event, tagged with the full lexicon `$type`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "$type")]
pub enum ModEvent {
    #[serde(rename = "tools.ozone.moderation.defs#modEventLabel")]
    Label(ModEventLabel),
    #[serde(rename = "tools.ozone.moderation.defs#modEventTakedown")]
    Takedown(ModEventTakedown),
    #[serde(rename = "tools.ozone.moderation.defs#modEventReverseTakedown")]
    ReverseTakedown(ModEventReverseTakedown),
    #[serde(rename = "tools.ozone.moderation.defs#modEventComment")]
    Comment(ModEventComment),
    #[serde(rename = "tools.ozone.moderation.defs#modEventAcknowledge")]
    Acknowledge(ModEventAcknowledge),
    #[serde(rename = "tools.ozone.moderation.defs#modEventEscalate")]
    Escalate(ModEventEscalate),
}

/// Inbound moderation event payload.
///
/// `$type` stays a plain string: event streams routinely carry kinds outside
/// the closed outbound set, and classification works on the string anyway.
/// Only the fields the bridge consumes are typed; everything else is ignored.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ModEventData {
    #[serde(rename = "$type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_label_vals: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negate_label_vals: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_in_hours: Option<i64>,
}

/// A moderation event as returned from the labeler's event stream.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModEventView {
    pub id: i64,
    pub event: ModEventData,
    pub subject: SubjectRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_blob_cids: Option<Vec<String>>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}
