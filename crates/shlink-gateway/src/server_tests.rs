use super::*;
use crate::client::RequestSigner;
use crate::error::AuthError;
use crate::resources::MemoryResources;
use serde_json::{Value, json};
use shlink_capabilities::CapabilityError;
use shlink_core::{AccessRequestItem, INITIALIZE_REFERENCE, ManualClock};
use shlink_crypto::KeyPair;
use shlink_policy::ClaimError;

const BASE: &str = "https://links.example";

struct Fixture {
    clock: ManualClock,
    server: Arc<AuthorizationServer>,
    resources: Arc<MemoryResources>,
}

fn fixture() -> Fixture {
    let clock = ManualClock::new(1_700_000_000);
    let resources = Arc::new(MemoryResources::new());
    let server = Arc::new(AuthorizationServer::with_clock(
        ServerSettings::new(BASE),
        Arc::clone(&resources) as Arc<dyn ResourceProvider>,
        clock.shared(),
    ));
    Fixture {
        clock,
        server,
        resources,
    }
}

impl Fixture {
    fn client(&self) -> RequestSigner {
        RequestSigner::with_clock(KeyPair::generate(), self.clock.shared())
    }

    async fn grant(
        &self,
        signer: &RequestSigner,
        access: Vec<AccessRequestItem>,
        pin: Option<&str>,
    ) -> GatewayResult<GrantResponse> {
        let mut body = GrantRequest::new(access, signer.descriptor());
        if let Some(pin) = pin {
            body = body.with_pin(pin);
        }
        let request = signer.sign("POST", &format!("{BASE}/gnap"), Some(&body), None)?;
        self.server.request_grant(&request).await
    }

    async fn initialize(&self, signer: &RequestSigner) -> GrantResponse {
        self.grant(
            signer,
            vec![AccessRequestItem::Reference(INITIALIZE_REFERENCE.to_owned())],
            None,
        )
        .await
        .unwrap()
    }

    async fn share(
        &self,
        signer: &RequestSigner,
        init: &GrantResponse,
        body: &Value,
    ) -> GatewayResult<PolicyResponse> {
        let policy_url = init.locations_of(AccessType::Share)[0];
        let request = signer.sign("PUT", policy_url, Some(body), Some(&init.access_token.value))?;
        self.server.put_policy(&request).await
    }

    async fn claim(
        &self,
        signer: &RequestSigner,
        package_id: &str,
        pin: Option<&str>,
    ) -> GatewayResult<GrantResponse> {
        self.grant(
            signer,
            vec![AccessRequestItem::Reference(package_id.to_owned())],
            pin,
        )
        .await
    }

    async fn fetch(&self, signer: &RequestSigner, url: &str, token: &str) -> GatewayResult<Value> {
        let request = signer.get(url, Some(token))?;
        self.server.fetch_resource(&request).await
    }
}

fn data_file(init: &GrantResponse, file: &str) -> String {
    format!("{}/{file}", init.locations_of(AccessType::Modify)[0])
}

#[tokio::test]
async fn test_initialize_grants_modify_and_share() {
    let f = fixture();
    let alice = f.client();

    let first = f.initialize(&alice).await;
    let second = f.initialize(&alice).await;

    let prefix = format!("{BASE}/shclinks/{}/", alice.client().key_id());
    let modify = first.locations_of(AccessType::Modify);
    let share = first.locations_of(AccessType::Share);
    assert_eq!(first.access_token.access.len(), 2);
    assert!(modify[0].starts_with(&prefix) && modify[0].ends_with("/data"));
    assert!(share[0].starts_with(&prefix) && share[0].ends_with("/policy"));
    assert_ne!(modify[0], second.locations_of(AccessType::Modify)[0]);
}

#[tokio::test]
async fn test_share_claim_fetch_flow() {
    let f = fixture();
    let (alice, bob, carol) = (f.client(), f.client(), f.client());

    let init = f.initialize(&alice).await;
    let file = data_file(&init, "x.json");
    f.resources.insert(file.clone(), json!({"entry": [1, 2]}));

    let shared = f
        .share(&alice, &init, &json!({"claimLimit": 1, "locations": [file]}))
        .await
        .unwrap();
    assert_eq!(shared.gnap.url, format!("{BASE}/gnap"));

    let claimed = f.claim(&bob, &shared.gnap.access, None).await.unwrap();
    assert_eq!(claimed.locations_of(AccessType::Read), vec![file.as_str()]);

    let payload = f.fetch(&bob, &file, &claimed.access_token.value).await.unwrap();
    assert_eq!(payload, json!({"entry": [1, 2]}));

    let refused = f.claim(&carol, &shared.gnap.access, None).await;
    assert!(matches!(
        refused,
        Err(GatewayError::ClaimRejected { ref reasons })
            if matches!(reasons[..], [ClaimError::ClaimLimitReached { claim_limit: 1, .. }])
    ));
}

#[tokio::test]
async fn test_fetch_requires_exact_location() {
    let f = fixture();
    let (alice, bob) = (f.client(), f.client());
    let init = f.initialize(&alice).await;
    let file = data_file(&init, "x.json");
    f.resources.insert(file.clone(), json!({}));

    let shared = f
        .share(&alice, &init, &json!({"claimLimit": 1, "locations": [file]}))
        .await
        .unwrap();
    let claimed = f.claim(&bob, &shared.gnap.access, None).await.unwrap();
    let token = &claimed.access_token.value;

    let err = f
        .fetch(&bob, &data_file(&init, "X.json"), token)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Capability(CapabilityError::AccessDenied { .. })
    ));
    assert_eq!(err.status(), 403);
}

#[tokio::test]
async fn test_share_requires_share_grant() {
    let f = fixture();
    let (alice, bob) = (f.client(), f.client());
    let alice_init = f.initialize(&alice).await;
    let bob_init = f.initialize(&bob).await;
    let body = json!({"claimLimit": 1, "locations": [data_file(&alice_init, "x.json")]});

    // Bob's token carries share on his own package only.
    let policy_url = alice_init.locations_of(AccessType::Share)[0];
    let request = bob
        .sign("PUT", policy_url, Some(&body), Some(&bob_init.access_token.value))
        .unwrap();
    assert!(matches!(
        f.server.put_policy(&request).await,
        Err(GatewayError::Capability(CapabilityError::AccessDenied { .. }))
    ));

    // No token and no declared key: nothing to verify against.
    let request = alice.sign("PUT", policy_url, Some(&body), None).unwrap();
    let err = f.server.put_policy(&request).await.unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Authentication(AuthError::MissingClientKey)
    ));
    assert_eq!(err.status(), 401);

    // A declared key proves who signed, but grants nothing.
    let mut declared = body.clone();
    declared["client"] = json!({"key": {"jwk": alice.client().jwk()}});
    let request = alice.sign("PUT", policy_url, Some(&declared), None).unwrap();
    let err = f.server.put_policy(&request).await.unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Capability(CapabilityError::TokenNotPresented)
    ));
    assert_eq!(err.status(), 401);
}

#[tokio::test]
async fn test_share_locations_must_stay_in_package() {
    let f = fixture();
    let alice = f.client();
    let init = f.initialize(&alice).await;
    let other = f.initialize(&alice).await;

    let err = f
        .share(
            &alice,
            &init,
            &json!({"claimLimit": 1, "locations": [data_file(&init, "a.json"), data_file(&other, "b.json")]}),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::LocationOutsidePackage { .. }));

    let err = f
        .share(&alice, &init, &json!({"claimLimit": 1, "locations": []}))
        .await
        .unwrap_err();
    assert_eq!(err.status(), 400);

    let err = f
        .share(
            &alice,
            &init,
            &json!({"claimLimit": 0, "locations": [data_file(&init, "a.json")]}),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Policy(_)));
    assert_eq!(err.status(), 400);
}

#[tokio::test]
async fn test_replacing_policy_revokes_claims_only() {
    let f = fixture();
    let (alice, bob) = (f.client(), f.client());
    let init = f.initialize(&alice).await;
    let file = data_file(&init, "x.json");
    f.resources.insert(file.clone(), json!({}));

    let body = json!({"claimLimit": 1, "locations": [file]});
    let shared = f.share(&alice, &init, &body).await.unwrap();
    let claimed = f.claim(&bob, &shared.gnap.access, None).await.unwrap();
    assert!(f.fetch(&bob, &file, &claimed.access_token.value).await.is_ok());

    f.share(&alice, &init, &body).await.unwrap();

    let err = f
        .fetch(&bob, &file, &claimed.access_token.value)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Authentication(AuthError::UnknownAccessToken)
    ));

    // The owner's initialize token survives and the link is claimable again.
    assert!(f.share(&alice, &init, &body).await.is_ok());
    assert!(f.claim(&bob, &shared.gnap.access, None).await.is_ok());
}

#[tokio::test]
async fn test_pin_protected_link() {
    let f = fixture();
    let (alice, bob) = (f.client(), f.client());
    let init = f.initialize(&alice).await;
    let shared = f
        .share(
            &alice,
            &init,
            &json!({"needPin": "2468", "claimLimit": 2, "locations": [data_file(&init, "x.json")]}),
        )
        .await
        .unwrap();

    let err = f
        .claim(&bob, &shared.gnap.access, Some("1111"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), 409);

    let missing = f.claim(&bob, &shared.gnap.access, None).await;
    assert!(matches!(missing, Err(GatewayError::ClaimRejected { .. })));

    let ok = f
        .claim(&bob, &shared.gnap.access, Some("2468"))
        .await
        .unwrap();
    assert_eq!(ok.access_token.access.len(), 1);
    let link = f.server.links().get(&shared.gnap.access).unwrap().unwrap();
    assert_eq!(link.failures, 0);
}

#[tokio::test]
async fn test_manage_within_own_namespace() {
    let f = fixture();
    let alice = f.client();
    let own = format!("{BASE}/shclinks/{}/pkg/data", alice.client().key_id());
    let foreign = format!("{BASE}/shclinks/someone-else/pkg/data");

    let granted = f
        .grant(
            &alice,
            vec![AccessRequestItem::Item(shlink_core::RarItem::new(
                AccessType::Modify,
                [own.clone()],
            ))],
            None,
        )
        .await
        .unwrap();
    assert_eq!(granted.locations_of(AccessType::Modify), vec![own.as_str()]);

    let denied = f
        .grant(
            &alice,
            vec![AccessRequestItem::Item(shlink_core::RarItem::new(
                AccessType::Modify,
                [own, foreign],
            ))],
            None,
        )
        .await
        .unwrap();
    assert!(denied.access_token.access.is_empty());
}

#[tokio::test]
async fn test_cannot_take_over_foreign_link_id() {
    let f = fixture();
    let (alice, mallory) = (f.client(), f.client());
    let init = f.initialize(&alice).await;
    let shared = f
        .share(
            &alice,
            &init,
            &json!({"claimLimit": 5, "locations": [data_file(&init, "x.json")]}),
        )
        .await
        .unwrap();
    let package_id = shared.gnap.access;

    // Mallory manages a same-named package in her own namespace.
    let prefix = format!("{BASE}/shclinks/{}/{package_id}", mallory.client().key_id());
    let policy_url = format!("{prefix}/policy");
    let granted = f
        .grant(
            &mallory,
            vec![AccessRequestItem::Item(shlink_core::RarItem::new(
                AccessType::Share,
                [policy_url.clone()],
            ))],
            None,
        )
        .await
        .unwrap();

    let body = json!({"claimLimit": 5, "locations": [format!("{prefix}/data/x.json")]});
    let request = mallory
        .sign("PUT", &policy_url, Some(&body), Some(&granted.access_token.value))
        .unwrap();
    assert!(matches!(
        f.server.put_policy(&request).await,
        Err(GatewayError::ForeignPackage { .. })
    ));
}

/// Share `package_id` from `signer`'s own namespace with a manage grant.
async fn share_own_namespace(
    f: &Fixture,
    signer: &RequestSigner,
    package_id: &str,
) -> GatewayResult<PolicyResponse> {
    let prefix = format!("{BASE}/shclinks/{}/{package_id}", signer.client().key_id());
    let policy_url = format!("{prefix}/policy");
    let granted = f
        .grant(
            signer,
            vec![AccessRequestItem::Item(shlink_core::RarItem::new(
                AccessType::Share,
                [policy_url.clone()],
            ))],
            None,
        )
        .await?;
    assert_eq!(granted.access_token.access.len(), 1);

    let body = json!({"claimLimit": 5, "locations": [format!("{prefix}/data/x.json")]});
    let request = signer.sign("PUT", &policy_url, Some(&body), Some(&granted.access_token.value))?;
    f.server.put_policy(&request).await
}

#[tokio::test]
async fn test_initialized_package_cannot_be_shared_first_by_another_client() {
    let f = fixture();
    let (alice, mallory) = (f.client(), f.client());
    let init = f.initialize(&alice).await;
    let package_id = init.locations_of(AccessType::Share)[0]
        .trim_end_matches("/policy")
        .rsplit('/')
        .next()
        .unwrap()
        .to_owned();

    assert!(matches!(
        share_own_namespace(&f, &mallory, &package_id).await,
        Err(GatewayError::ForeignPackage { .. })
    ));
    assert!(f.server.links.get(&package_id).unwrap().is_none());

    let shared = f
        .share(
            &alice,
            &init,
            &json!({"claimLimit": 1, "locations": [data_file(&init, "x.json")]}),
        )
        .await
        .unwrap();
    assert_eq!(shared.gnap.access, package_id);
}

#[tokio::test]
async fn test_self_named_package_bound_to_first_publisher() {
    let f = fixture();
    let (alice, mallory) = (f.client(), f.client());

    share_own_namespace(&f, &alice, "family-records").await.unwrap();
    share_own_namespace(&f, &alice, "family-records").await.unwrap();
    assert!(matches!(
        share_own_namespace(&f, &mallory, "family-records").await,
        Err(GatewayError::ForeignPackage { .. })
    ));
}

#[tokio::test]
async fn test_concurrent_claims_respect_limit() {
    let f = fixture();
    let alice = f.client();
    let init = f.initialize(&alice).await;
    let shared = f
        .share(
            &alice,
            &init,
            &json!({"claimLimit": 3, "locations": [data_file(&init, "x.json")]}),
        )
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let server = Arc::clone(&f.server);
        let signer = f.client();
        let body = GrantRequest::new(
            vec![AccessRequestItem::Reference(shared.gnap.access.clone())],
            signer.descriptor(),
        );
        let request = signer
            .sign("POST", &format!("{BASE}/gnap"), Some(&body), None)
            .unwrap();
        tasks.push(tokio::spawn(async move { server.request_grant(&request).await }));
    }

    let mut granted = 0;
    let mut refused = 0;
    for result in futures::future::join_all(tasks).await {
        match result.unwrap() {
            Ok(_) => granted += 1,
            Err(GatewayError::ClaimRejected { .. }) => refused += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!((granted, refused), (3, 7));
}

#[tokio::test]
async fn test_handle_maps_statuses() {
    let f = fixture();
    let alice = f.client();

    let body = GrantRequest::new(
        vec![AccessRequestItem::Reference(INITIALIZE_REFERENCE.to_owned())],
        alice.descriptor(),
    );
    let request = alice
        .sign("POST", &format!("{BASE}/gnap"), Some(&body), None)
        .unwrap();
    let response = f.server.handle(&request).await;
    assert_eq!(response.status, 200);
    assert!(response.body["access_token"]["value"].is_string());

    f.clock.advance(301);
    let response = f.server.handle(&request).await;
    assert_eq!(response.status, 401);
    assert_eq!(response.body["error"], "authentication_failed");

    let response = f
        .server
        .handle(&InboundRequest::new("GET", format!("{BASE}/nowhere")))
        .await;
    assert_eq!(response.status, 404);
}

#[tokio::test]
async fn test_sweep_expired() {
    let f = fixture();
    let alice = f.client();
    f.initialize(&alice).await;
    f.initialize(&alice).await;
    assert_eq!(f.server.tokens().len(), 2);

    f.clock.advance(f.server.settings().token_ttl_secs);
    assert_eq!(f.server.sweep_expired().unwrap(), 2);
    assert!(f.server.tokens().is_empty());
}

#[tokio::test]
async fn test_token_sweeper_removes_expired_tokens() {
    let clock = ManualClock::new(1_700_000_000);
    let settings = ServerSettings {
        sweep_interval: Duration::from_millis(10),
        ..ServerSettings::new(BASE)
    };
    let server = Arc::new(AuthorizationServer::with_clock(
        settings,
        Arc::new(MemoryResources::new()),
        clock.shared(),
    ));
    let alice = RequestSigner::with_clock(KeyPair::generate(), clock.shared());
    let body = GrantRequest::new(
        vec![AccessRequestItem::Reference(INITIALIZE_REFERENCE.to_owned())],
        alice.descriptor(),
    );
    let request = alice
        .sign("POST", &format!("{BASE}/gnap"), Some(&body), None)
        .unwrap();
    server.request_grant(&request).await.unwrap();

    let sweeper = AuthorizationServer::spawn_token_sweeper(Arc::clone(&server));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(server.tokens().len(), 1);

    clock.advance(server.settings().token_ttl_secs);
    for _ in 0..100 {
        if server.tokens().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    sweeper.abort();
    assert!(server.tokens().is_empty());
}
