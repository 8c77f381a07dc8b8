//! Bidirectional translation between the platform's policy taxonomy and the
//! labeler's label vocabulary, plus classification of inbound event kinds.
//!
//! Tenants may override the table completely: a tenant with at least one
//! mapping row uses exactly its own rows, a tenant with none uses the default
//! table. The two sets are never merged.

use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Which translation direction a mapping participates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MappingDirection {
    /// Labeler label → platform policy only.
    Inbound,
    /// Platform policy → labeler label only.
    Outbound,
    /// Both directions.
    Both,
}

impl MappingDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inbound => "INBOUND",
            Self::Outbound => "OUTBOUND",
            Self::Both => "BOTH",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "INBOUND" => Some(Self::Inbound),
            "OUTBOUND" => Some(Self::Outbound),
            "BOTH" => Some(Self::Both),
            _ => None,
        }
    }

    fn applies_inbound(&self) -> bool {
        matches!(self, Self::Inbound | Self::Both)
    }

    fn applies_outbound(&self) -> bool {
        matches!(self, Self::Outbound | Self::Both)
    }
}

/// One policy-type ↔ label-value pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelMapping {
    pub policy_type: String,
    pub label_value: String,
    pub direction: MappingDirection,
}

impl LabelMapping {
    pub fn new(
        policy_type: impl Into<String>,
        label_value: impl Into<String>,
        direction: MappingDirection,
    ) -> Self {
        Self {
            policy_type: policy_type.into(),
            label_value: label_value.into(),
            direction,
        }
    }
}

/// Default translation table, used for tenants with no mapping rows.
pub static DEFAULT_MAPPINGS: LazyLock<Vec<LabelMapping>> = LazyLock::new(|| {
    use MappingDirection::{Both, Outbound};
    vec![
        LabelMapping::new("HATE", "hate", Both),
        LabelMapping::new("VIOLENCE", "violence", Both),
        LabelMapping::new("VIOLENCE", "gore", Both),
        LabelMapping::new("SEXUAL_CONTENT", "sexual", Both),
        LabelMapping::new("SEXUAL_CONTENT", "porn", Both),
        LabelMapping::new("SEXUAL_CONTENT", "nudity", Both),
        LabelMapping::new("SPAM", "spam", Both),
        LabelMapping::new("HARASSMENT", "harassment", Both),
        LabelMapping::new("SELF_HARM_AND_SUICIDE", "self-harm", Both),
        LabelMapping::new("TERRORISM", "terrorism", Both),
        LabelMapping::new("SEXUAL_EXPLOITATION", "csam", Both),
        LabelMapping::new("SEXUAL_EXPLOITATION", "!hide", Outbound),
    ]
});

/// A tenant's effective table: its own rows when it has any, the default
/// table otherwise.
pub fn effective_mappings(tenant_mappings: &[LabelMapping]) -> &[LabelMapping] {
    if tenant_mappings.is_empty() {
        &DEFAULT_MAPPINGS
    } else {
        tenant_mappings
    }
}

/// Translate labeler labels into platform policy types.
///
/// Only `INBOUND`/`BOTH` rows participate. Output order follows the input
/// labels (first mapping hit wins a policy's position); duplicates collapse.
pub fn labels_to_policies(mappings: &[LabelMapping], labels: &[String]) -> Vec<String> {
    let mut policies: Vec<String> = Vec::new();
    for label in labels {
        for mapping in mappings {
            if mapping.direction.applies_inbound()
                && mapping.label_value == *label
                && !policies.contains(&mapping.policy_type)
            {
                policies.push(mapping.policy_type.clone());
            }
        }
    }
    policies
}

/// Translate a platform policy type into labeler labels.
///
/// Only `OUTBOUND`/`BOTH` rows participate; duplicates collapse.
pub fn policy_to_labels(mappings: &[LabelMapping], policy_type: &str) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for mapping in mappings {
        if mapping.direction.applies_outbound()
            && mapping.policy_type == policy_type
            && !labels.contains(&mapping.label_value)
        {
            labels.push(mapping.label_value.clone());
        }
    }
    labels
}

/// Internal category of an inbound moderation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventCategory {
    Report,
    Takedown,
    Label,
    Comment,
    Escalate,
}

/// Classification rules, tested in order; the first matching substring wins.
const CATEGORY_RULES: [(&str, EventCategory); 5] = [
    ("modEventReport", EventCategory::Report),
    ("modEventTakedown", EventCategory::Takedown),
    ("modEventLabel", EventCategory::Label),
    ("modEventComment", EventCategory::Comment),
    ("modEventEscalate", EventCategory::Escalate),
];

/// Classify an inbound event `$type` string, or `None` if no rule matches.
pub fn classify_event_type(kind: &str) -> Option<EventCategory> {
    CATEGORY_RULES
        .iter()
        .find(|(needle, _)| kind.contains(needle))
        .map(|(_, category)| *category)
}
