//! `tools.ozone.moderation.queryEvents`

use crate::defs::ModEventView;
use chrono::{DateTime, Utc};
use labelbridge_common::xrpc::{XrpcMethod, XrpcRequest};
use serde::{Deserialize, Serialize};

/// Query parameters for paging through a labeler's moderation event stream.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct QueryEventsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    /// Event `$type` filters; serialized as one `types=` pair per value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_direction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_after: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_before: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QueryEventsOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    pub events: Vec<ModEventView>,
}

impl XrpcRequest for QueryEventsParams {
    const NSID: &'static str = "tools.ozone.moderation.queryEvents";
    const METHOD: XrpcMethod = XrpcMethod::Query;
    type Output = QueryEventsOutput;
}

#[cfg(test)]
mod tests {
    use super::*;
    use labelbridge_common::xrpc::build_http_request;
    use url::Url;

    #[test]
    fn query_string_carries_cursor_and_direction() {
        let params = QueryEventsParams {
            cursor: Some("42".into()),
            limit: Some(100),
            sort_direction: Some("asc".into()),
            ..Default::default()
        };
        let req = build_http_request(
            &Url::parse("https://labeler.example").unwrap(),
            &params,
            None,
            &[],
        )
        .unwrap();
        let uri = req.uri().to_string();
        assert!(uri.contains("/xrpc/tools.ozone.moderation.queryEvents"));
        assert!(uri.contains("cursor=42"));
        assert!(uri.contains("limit=100"));
        assert!(uri.contains("sortDirection=asc"));
        assert_eq!(req.method(), http::Method::GET);
    }

    #[test]
    fn output_parses_with_and_without_cursor() {
        let with: QueryEventsOutput =
            serde_json::from_str(r#"{"cursor":"7","events":[]}"#).unwrap();
        assert_eq!(with.cursor.as_deref(), Some("7"));

        let without: QueryEventsOutput = serde_json::from_str(r#"{"events":[]}"#).unwrap();
        assert!(without.cursor.is_none());
    }
}
