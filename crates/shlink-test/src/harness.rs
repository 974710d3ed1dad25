//! In-process authorization server for tests.

use std::sync::Arc;

use serde_json::Value;
use shlink_core::{AccessRequestItem, AccessType, INITIALIZE_REFERENCE, ManualClock};
use shlink_gateway::{
    AuthorizationServer, GatewayError, GatewayResult, GrantResponse, MemoryResources,
    PolicyRequest, PolicyResponse, ResourceProvider, Response, ServerSettings,
};

use crate::client::TestClient;
use crate::fixtures::{TEST_EPOCH, test_settings};

/// A package created by an initialize grant, with the owner's token.
#[derive(Debug, Clone)]
pub struct OwnedPackage {
    /// Bearer token carrying `modify` on the data URL and `share` on the
    /// policy URL.
    pub token: String,
    /// `.../{package}/data`.
    pub data_url: String,
    /// `.../{package}/policy`.
    pub policy_url: String,
    /// The package (and link) id.
    pub package_id: String,
}

impl OwnedPackage {
    fn from_grant(grant: &GrantResponse) -> GatewayResult<Self> {
        let first = |access_type| {
            grant
                .locations_of(access_type)
                .first()
                .map(|l| (*l).to_owned())
                .ok_or_else(|| {
                    GatewayError::BadRequest(format!("initialize grant lacks {access_type:?}"))
                })
        };
        let data_url = first(AccessType::Modify)?;
        let policy_url = first(AccessType::Share)?;
        let package_id = policy_url
            .trim_end_matches("/policy")
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_owned();
        Ok(Self {
            token: grant.access_token.value.clone(),
            data_url,
            policy_url,
            package_id,
        })
    }

    /// URL of `file` inside this package's data directory.
    #[must_use]
    pub fn file_url(&self, file: &str) -> String {
        format!("{}/{file}", self.data_url)
    }
}

/// An [`AuthorizationServer`] on a [`ManualClock`] with in-memory resources.
#[derive(Debug)]
pub struct TestHarness {
    /// Shared clock; advancing it ages tokens and signed requests alike.
    pub clock: ManualClock,
    /// Resources served to authorized reads.
    pub resources: Arc<MemoryResources>,
    /// The server under test.
    pub server: Arc<AuthorizationServer>,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    /// Harness with [`test_settings`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(test_settings())
    }

    /// Harness with custom settings.
    #[must_use]
    pub fn with_settings(settings: ServerSettings) -> Self {
        let clock = ManualClock::new(TEST_EPOCH);
        let resources = Arc::new(MemoryResources::new());
        let server = Arc::new(AuthorizationServer::with_clock(
            settings,
            Arc::clone(&resources) as Arc<dyn ResourceProvider>,
            clock.shared(),
        ));
        Self {
            clock,
            resources,
            server,
        }
    }

    /// A new client signing on this harness's clock.
    #[must_use]
    pub fn client(&self, name: &str) -> TestClient {
        TestClient::new(name, self.clock.shared())
    }

    /// Move the clock forward.
    pub fn advance(&self, seconds: i64) {
        self.clock.advance(seconds);
    }

    /// Serve `value` at `location`.
    pub fn publish(&self, location: impl Into<String>, value: Value) {
        self.resources.insert(location, value);
    }

    /// Request `access` through `POST /gnap`.
    ///
    /// # Errors
    ///
    /// Whatever the grant endpoint returns.
    pub async fn grant(
        &self,
        client: &TestClient,
        access: Vec<AccessRequestItem>,
        pin: Option<&str>,
    ) -> GatewayResult<GrantResponse> {
        let request = client.grant_request(access, pin)?;
        self.server.request_grant(&request).await
    }

    /// Create a package owned by `client`.
    ///
    /// # Errors
    ///
    /// Whatever the grant endpoint returns.
    pub async fn initialize(&self, client: &TestClient) -> GatewayResult<OwnedPackage> {
        let grant = self
            .grant(
                client,
                vec![AccessRequestItem::Reference(INITIALIZE_REFERENCE.to_owned())],
                None,
            )
            .await?;
        OwnedPackage::from_grant(&grant)
    }

    /// Replace `package`'s link policy.
    ///
    /// # Errors
    ///
    /// Whatever the policy endpoint returns.
    pub async fn share(
        &self,
        client: &TestClient,
        package: &OwnedPackage,
        body: &PolicyRequest,
    ) -> GatewayResult<PolicyResponse> {
        let request = client.send("PUT", &package.policy_url, body, Some(&package.token))?;
        self.server.put_policy(&request).await
    }

    /// Claim `link_id`.
    ///
    /// # Errors
    ///
    /// Whatever the grant endpoint returns.
    pub async fn claim(
        &self,
        client: &TestClient,
        link_id: &str,
        pin: Option<&str>,
    ) -> GatewayResult<GrantResponse> {
        self.grant(
            client,
            vec![AccessRequestItem::Reference(link_id.to_owned())],
            pin,
        )
        .await
    }

    /// Read `url` presenting `token`.
    ///
    /// # Errors
    ///
    /// Whatever the data endpoint returns.
    pub async fn fetch(&self, client: &TestClient, url: &str, token: &str) -> GatewayResult<Value> {
        let request = client.get(url, token)?;
        self.server.fetch_resource(&request).await
    }

    /// Like [`TestHarness::fetch`], rendered through the dispatcher.
    ///
    /// # Errors
    ///
    /// Returns an error only if the request cannot be signed.
    pub async fn fetch_response(
        &self,
        client: &TestClient,
        url: &str,
        token: &str,
    ) -> GatewayResult<Response> {
        let request = client.get(url, token)?;
        Ok(self.server.handle(&request).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::share_body;

    #[tokio::test]
    async fn test_initialize_describes_package() {
        let harness = TestHarness::new();
        let alice = harness.client("alice");

        let package = harness.initialize(&alice).await.unwrap();
        assert!(package.data_url.contains(alice.key_id()));
        assert!(package.data_url.ends_with(&format!("/{}/data", package.package_id)));
        assert_eq!(
            package.policy_url,
            package.data_url.replace("/data", "/policy")
        );
    }

    #[tokio::test]
    async fn test_share_claim_fetch_round() {
        let harness = TestHarness::new();
        let (alice, bob) = (harness.client("alice"), harness.client("bob"));

        let package = harness.initialize(&alice).await.unwrap();
        let file = package.file_url("bundle.json");
        harness.publish(file.clone(), serde_json::json!({"ok": true}));

        let link = harness
            .share(&alice, &package, &share_body([&file], 1))
            .await
            .unwrap();
        assert_eq!(link.gnap.access, package.package_id);

        let grant = harness.claim(&bob, &link.gnap.access, None).await.unwrap();
        let value = harness
            .fetch(&bob, &file, &grant.access_token.value)
            .await
            .unwrap();
        assert_eq!(value["ok"], true);
    }
}
