//! Status and health passthroughs.

mod common;

use common::Harness;
use labelbridge::error::BridgeError;
use labelbridge_ozone::query_statuses::QueryStatusesParams;

#[tokio::test]
async fn statuses_pass_through_for_configured_tenants() {
    let harness = Harness::new();
    harness.add_tenant("T1").await;
    harness
        .http
        .push(
            200,
            serde_json::json!({
                "cursor": "s1",
                "subjectStatuses": [{
                    "id": 3,
                    "subject": {"$type": "com.atproto.admin.defs#repoRef", "did": "did:plc:x"},
                    "reviewState": "tools.ozone.moderation.defs#reviewOpen",
                    "takendown": false
                }]
            }),
        )
        .await;

    let output = harness
        .bridge
        .query_statuses(
            "T1",
            &QueryStatusesParams {
                review_state: Some("tools.ozone.moderation.defs#reviewOpen".to_owned()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(output.cursor.as_deref(), Some("s1"));
    assert_eq!(output.subject_statuses.len(), 1);

    let log = harness.http.take_log().await;
    assert!(
        log[0]
            .uri()
            .to_string()
            .contains("/xrpc/tools.ozone.moderation.queryStatuses")
    );
    assert!(log[0].headers().contains_key(http::header::AUTHORIZATION));
}

#[tokio::test]
async fn statuses_require_a_credential() {
    let harness = Harness::new();
    let err = harness
        .bridge
        .query_statuses("missing", &QueryStatusesParams::default())
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::NotConfigured { .. }));
}

#[tokio::test]
async fn health_probe_is_unauthenticated() {
    let harness = Harness::new();
    harness.add_tenant("T1").await;
    harness
        .http
        .push(200, serde_json::json!({"version": "0.9.3"}))
        .await;

    let health = harness.bridge.check_health("T1").await.unwrap();
    assert_eq!(health.version.as_deref(), Some("0.9.3"));

    let log = harness.http.take_log().await;
    assert!(log[0].uri().to_string().contains("/xrpc/_health"));
    assert!(!log[0].headers().contains_key(http::header::AUTHORIZATION));
}

#[tokio::test]
async fn is_configured_reflects_the_credential_store() {
    let harness = Harness::new();
    assert!(!harness.bridge.is_configured("T1").await.unwrap());
    harness.add_tenant("T1").await;
    assert!(harness.bridge.is_configured("T1").await.unwrap());
}
