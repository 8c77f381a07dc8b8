//! `tools.ozone.moderation.emitEvent`

use crate::defs::{ModEvent, ModEventData, SubjectRef};
use chrono::{DateTime, Utc};
use labelbridge_common::xrpc::{XrpcMethod, XrpcRequest};
use serde::{Deserialize, Serialize};

/// Procedure input: apply a moderation event to a subject.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EmitEvent {
    pub event: ModEvent,
    pub subject: SubjectRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_blob_cids: Option<Vec<String>>,
    pub created_by: String,
}

/// The event as recorded by the labeler.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EmitEventOutput {
    pub id: i64,
    pub event: ModEventData,
    pub subject: SubjectRef,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl XrpcRequest for EmitEvent {
    const NSID: &'static str = "tools.ozone.moderation.emitEvent";
    const METHOD: XrpcMethod = XrpcMethod::Procedure("application/json");
    type Output = EmitEventOutput;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::ModEventLabel;
    use labelbridge_common::xrpc::build_http_request;
    use url::Url;

    #[test]
    fn body_is_json_with_typed_event_and_subject() {
        let input = EmitEvent {
            event: ModEvent::Label(ModEventLabel {
                create_label_vals: vec!["spam".into()],
                negate_label_vals: vec![],
                comment: None,
            }),
            subject: SubjectRef::repo("did:plc:abc"),
            subject_blob_cids: None,
            created_by: "did:plc:mod".into(),
        };
        let req = build_http_request(
            &Url::parse("https://labeler.example").unwrap(),
            &input,
            Some("tok"),
            &[],
        )
        .unwrap();
        assert_eq!(req.method(), http::Method::POST);
        assert!(
            req.uri()
                .to_string()
                .contains("/xrpc/tools.ozone.moderation.emitEvent")
        );
        let body: serde_json::Value = serde_json::from_slice(req.body()).unwrap();
        assert_eq!(
            body["event"]["$type"],
            "tools.ozone.moderation.defs#modEventLabel"
        );
        assert_eq!(body["subject"]["$type"], "com.atproto.admin.defs#repoRef");
        assert_eq!(body["createdBy"], "did:plc:mod");
    }
}
