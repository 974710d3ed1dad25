//! End-to-end sharing: initialize, upload, share, claim, read, re-share.

use serde_json::json;
use shlink_capabilities::CapabilityError;
use shlink_core::AccessType;
use shlink_gateway::{AuthError, GatewayError};
use shlink_policy::ClaimError;
use shlink_test::prelude::*;

#[tokio::test]
async fn test_full_sharing_lifecycle() {
    init_test_tracing();
    let harness = TestHarness::new();
    let (alice, bob, carol, dave) = (
        harness.client("alice"),
        harness.client("bob"),
        harness.client("carol"),
        harness.client("dave"),
    );

    let package = harness.initialize(&alice).await.unwrap();
    let labs = package.file_url("labs.json");
    let meds = package.file_url("meds.json");
    harness.publish(labs.clone(), json!({"resourceType": "Bundle", "entry": []}));
    harness.publish(meds.clone(), json!({"resourceType": "Bundle", "entry": [{}]}));

    let link = harness
        .share(&alice, &package, &share_body([&labs, &meds], 2))
        .await
        .unwrap();
    assert_eq!(link.status, "PUT new policy");
    assert_eq!(link.gnap.url, format!("{TEST_PUBLIC_URL}/gnap"));

    // Two recipients claim; the third is turned away.
    let bob_grant = harness.claim(&bob, &link.gnap.access, None).await.unwrap();
    let carol_grant = harness.claim(&carol, &link.gnap.access, None).await.unwrap();
    assert_eq!(
        bob_grant.locations_of(AccessType::Read),
        vec![labs.as_str(), meds.as_str()]
    );
    let err = harness
        .claim(&dave, &link.gnap.access, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GatewayError::ClaimRejected { ref reasons }
            if matches!(reasons[..], [ClaimError::ClaimLimitReached { .. }])
    ));

    let bob_token = bob_grant.access_token.value.clone();
    let bundle = harness.fetch(&bob, &meds, &bob_token).await.unwrap();
    assert_eq!(bundle["entry"].as_array().map(Vec::len), Some(1));
    assert!(
        harness
            .fetch(&carol, &labs, &carol_grant.access_token.value)
            .await
            .is_ok()
    );

    // The owner narrows the share: every earlier claim is revoked.
    harness
        .share(&alice, &package, &share_body([&labs], 1))
        .await
        .unwrap();
    let err = harness.fetch(&bob, &labs, &bob_token).await.unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Authentication(AuthError::UnknownAccessToken)
    ));

    // Dave can now claim the single remaining slot, for labs only.
    let dave_grant = harness.claim(&dave, &link.gnap.access, None).await.unwrap();
    let dave_token = dave_grant.access_token.value;
    assert!(harness.fetch(&dave, &labs, &dave_token).await.is_ok());
    assert!(matches!(
        harness.fetch(&dave, &meds, &dave_token).await,
        Err(GatewayError::Capability(CapabilityError::AccessDenied { .. }))
    ));
}

#[tokio::test]
async fn test_tokens_expire() {
    let harness = TestHarness::new();
    let (alice, bob) = (harness.client("alice"), harness.client("bob"));
    let package = harness.initialize(&alice).await.unwrap();
    let file = package.file_url("x.json");
    harness.publish(file.clone(), json!({}));

    let link = harness
        .share(&alice, &package, &share_body([&file], 1))
        .await
        .unwrap();
    let grant = harness.claim(&bob, &link.gnap.access, None).await.unwrap();
    let token = grant.access_token.value;

    harness.advance(299);
    assert!(harness.fetch(&bob, &file, &token).await.is_ok());

    harness.advance(1);
    let response = harness.fetch_response(&bob, &file, &token).await.unwrap();
    assert_eq!(response.status, 403);
    assert_eq!(response.body["error"], "token_expired");

    assert_eq!(harness.server.sweep_expired().unwrap(), 2);
}

#[tokio::test]
async fn test_owner_can_share_again_with_initialize_token() {
    let harness = TestHarness::new();
    let alice = harness.client("alice");
    let package = harness.initialize(&alice).await.unwrap();
    let file = package.file_url("x.json");

    for limit in 1..=3 {
        let link = harness
            .share(&alice, &package, &share_body([&file], limit))
            .await
            .unwrap();
        let policy = harness.server.links().get(&link.gnap.access).unwrap().unwrap();
        assert_eq!(policy.claim_limit, limit);
    }
}
