//! The authorization server: grant issuance, link sharing and guarded reads.

use std::sync::Arc;
use std::time::Duration;

use shlink_capabilities::{AccessTokenStore, DEFAULT_TOKEN_TTL_SECS};
use shlink_config::Config;
use shlink_core::{
    AccessType, ClientIdentity, PackageNamespace, RarItem, SharedClock, SystemClock,
};
use shlink_crypto::KeyThumbprint;
use shlink_policy::{
    DEFAULT_PIN_LOCKOUT_THRESHOLD, LinkRegistry, LinkTerms,
    PolicyContext, PolicyEngine, claimed_link_ids,
};
use shlink_telemetry::RequestContext;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, warn};

use crate::auth::{DEFAULT_FRESHNESS_WINDOW_SECS, RequestAuthenticator};
use crate::config_bridge;
use crate::error::{GatewayError, GatewayResult};
use crate::protocol::{GrantRequest, GrantResponse, PolicyRequest, PolicyResponse};
use crate::request::{InboundRequest, Response};
use crate::resources::ResourceProvider;
use crate::routes::Route;

/// Default interval between expired-token sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Settings the server runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Base URL clients sign against, without a trailing slash.
    pub public_url: String,
    /// Lifetime of issued tokens.
    pub token_ttl_secs: i64,
    /// Allowed distance between a request's `created` and now.
    pub freshness_window_secs: i64,
    /// Consecutive wrong PINs that deactivate a link.
    pub pin_lockout_threshold: u32,
    /// Largest claim limit a policy may set; uncapped when `None`.
    pub max_claim_limit: Option<u32>,
    /// Interval of the task started by [`AuthorizationServer::spawn_token_sweeper`].
    pub sweep_interval: Duration,
}

impl ServerSettings {
    /// Default settings served at `public_url`.
    #[must_use]
    pub fn new(public_url: impl Into<String>) -> Self {
        Self {
            public_url: public_url.into(),
            ..Self::default()
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            public_url: "http://localhost:3000".to_owned(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            freshness_window_secs: DEFAULT_FRESHNESS_WINDOW_SECS,
            pin_lockout_threshold: DEFAULT_PIN_LOCKOUT_THRESHOLD,
            max_claim_limit: None,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

/// Serves `POST /gnap`, `PUT .../policy` and `GET .../data/{file}`.
///
/// Link mutations are serialized per link id: a grant holds the locks of
/// every link it claims until its token is stored, and a policy
/// replacement holds its link's lock across the replacement and the
/// revocation of tokens claimed under the old policy.
pub struct AuthorizationServer {
    settings: ServerSettings,
    tokens: Arc<AccessTokenStore>,
    links: Arc<LinkRegistry>,
    engine: PolicyEngine,
    authenticator: RequestAuthenticator,
    resources: Arc<dyn ResourceProvider>,
}

impl AuthorizationServer {
    /// In-memory server on the system clock.
    #[must_use]
    pub fn new(settings: ServerSettings, resources: Arc<dyn ResourceProvider>) -> Self {
        Self::with_clock(settings, resources, SystemClock::shared())
    }

    /// In-memory server on `clock`.
    #[must_use]
    pub fn with_clock(
        settings: ServerSettings,
        resources: Arc<dyn ResourceProvider>,
        clock: SharedClock,
    ) -> Self {
        let tokens = Arc::new(
            AccessTokenStore::in_memory()
                .with_clock(Arc::clone(&clock))
                .with_ttl(settings.token_ttl_secs),
        );
        let links = Arc::new(
            LinkRegistry::in_memory()
                .with_lockout_threshold(settings.pin_lockout_threshold)
                .with_max_claim_limit(settings.max_claim_limit),
        );
        let authenticator = RequestAuthenticator::new(Arc::clone(&tokens), clock)
            .with_freshness_window(settings.freshness_window_secs);

        Self {
            settings,
            tokens,
            links,
            engine: PolicyEngine::new(),
            authenticator,
            resources,
        }
    }

    /// Server configured from a loaded [`Config`].
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] if the config cannot be converted.
    pub fn from_config(cfg: &Config, resources: Arc<dyn ResourceProvider>) -> GatewayResult<Self> {
        Ok(Self::new(config_bridge::from_config(cfg)?, resources))
    }

    /// The server settings.
    #[must_use]
    pub fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    /// The access token store.
    #[must_use]
    pub fn tokens(&self) -> &Arc<AccessTokenStore> {
        &self.tokens
    }

    /// The link registry.
    #[must_use]
    pub fn links(&self) -> &Arc<LinkRegistry> {
        &self.links
    }

    /// The request authenticator.
    #[must_use]
    pub fn authenticator(&self) -> &RequestAuthenticator {
        &self.authenticator
    }

    /// `POST /gnap`: authenticate, evaluate every requested item, issue one token.
    ///
    /// # Errors
    ///
    /// Authentication failures, a malformed grant request, or
    /// [`GatewayError::ClaimRejected`] when claims were refused and nothing
    /// at all was granted.
    pub async fn request_grant(&self, request: &InboundRequest) -> GatewayResult<GrantResponse> {
        let auth = self.authenticator.authenticate(request)?;
        let grant: GrantRequest = auth.parse_payload()?;
        self.issue(&auth.client, &grant).await
    }

    /// Evaluate `grant` for an already authenticated `client` and issue a token.
    ///
    /// # Errors
    ///
    /// As [`request_grant`](Self::request_grant), minus authentication.
    pub async fn issue(
        &self,
        client: &ClientIdentity,
        grant: &GrantRequest,
    ) -> GatewayResult<GrantResponse> {
        let items = &grant.access_token.access;
        let _guards = self.links.lock_many(claimed_link_ids(items)).await;

        let ctx = PolicyContext {
            client,
            pin: grant.pin(),
            public_url: &self.settings.public_url,
            registry: &self.links,
        };
        let outcome = self.engine.evaluate(items, &ctx)?;

        for rejection in &outcome.rejections {
            warn!(client = %client.key_id(), reason = %rejection, "Claim rejected");
        }
        if outcome.is_empty() && !outcome.rejections.is_empty() {
            return Err(GatewayError::ClaimRejected {
                reasons: outcome.rejections,
            });
        }

        let token = self.tokens.save(
            outcome.granted_access,
            outcome.enabling_policies,
            client.clone(),
        )?;
        Ok(GrantResponse::from(&token))
    }

    /// `PUT .../{package}/policy`: replace a link's terms and revoke every
    /// token claimed under the previous terms.
    ///
    /// # Errors
    ///
    /// Authentication failures, a token without `share` on this exact URL,
    /// locations outside the package's data directory, or invalid terms.
    pub async fn put_policy(&self, request: &InboundRequest) -> GatewayResult<PolicyResponse> {
        let Some(Route::Policy { owner, package_id }) =
            Route::resolve(&self.settings.public_url, &request.method, &request.url)
        else {
            return Err(not_found(request));
        };

        let auth = self.authenticator.authenticate(request)?;
        auth.authorize(AccessType::Share, &request.url)?;
        let body: PolicyRequest = auth.parse_payload()?;

        let owner = KeyThumbprint::from(owner);
        let namespace = PackageNamespace::new(&self.settings.public_url, &owner, &package_id);
        if body.locations.is_empty() {
            return Err(GatewayError::BadRequest(
                "a policy must list at least one location".to_owned(),
            ));
        }
        if let Some(outside) = body.locations.iter().find(|l| !namespace.contains_file(l)) {
            return Err(GatewayError::LocationOutsidePackage {
                location: outside.clone(),
                package_id,
            });
        }

        let _guard = self.links.lock(&package_id).await;

        // Packages made by `initialize` are already bound to their creator;
        // an id an owner picked itself is bound by its first policy.
        if !self.links.bind_owner(&package_id, &owner)? {
            return Err(GatewayError::ForeignPackage { package_id });
        }

        let terms = LinkTerms {
            pin: body.pin,
            claim_limit: body.claim_limit,
            granted_access: vec![RarItem::read(body.locations)],
        };
        self.links.put(&package_id, terms)?;
        let revoked = self.tokens.revoke_by_package(&package_id)?;

        info!(
            package = %package_id,
            owner = %auth.client.key_id(),
            revoked,
            "Link policy replaced"
        );
        Ok(PolicyResponse::new(&self.settings.public_url, package_id))
    }

    /// `GET .../data/{file}`: check the token covers this exact URL, then
    /// ask the resource provider.
    ///
    /// # Errors
    ///
    /// Authentication failures, gate denials, or provider errors.
    pub async fn fetch_resource(&self, request: &InboundRequest) -> GatewayResult<serde_json::Value> {
        let Some(Route::Data { file, .. }) =
            Route::resolve(&self.settings.public_url, &request.method, &request.url)
        else {
            return Err(not_found(request));
        };

        let auth = self.authenticator.authenticate(request)?;
        let token = auth.authorize(AccessType::Read, &request.url)?;
        debug!(token = %token.fingerprint(), location = %request.url, "Read authorized");

        self.resources.fetch(&request.url, &file).await
    }

    /// Dispatch `request` to its operation and render the result.
    pub async fn handle(&self, request: &InboundRequest) -> Response {
        let route = Route::resolve(&self.settings.public_url, &request.method, &request.url);
        let path = request
            .url
            .strip_prefix(&self.settings.public_url)
            .unwrap_or(&request.url);
        let mut context = RequestContext::new("gateway", request.method.as_str(), path);
        if let Some(route) = &route {
            context = context.routed_to(route.operation());
        }
        let span = context.span();

        let result = async {
            match route {
                Some(Route::Grant) => self.request_grant(request).await.and_then(|r| to_json(&r)),
                Some(Route::Policy { .. }) => {
                    self.put_policy(request).await.and_then(|r| to_json(&r))
                },
                Some(Route::Data { .. }) => self.fetch_resource(request).await,
                None => Err(not_found(request)),
            }
        }
        .instrument(span.clone())
        .await;

        let response = match result {
            Ok(body) => Response::ok(body),
            Err(e) => {
                span.in_scope(|| info!(status = e.status(), error = %e, "Request failed"));
                Response::error(&e)
            },
        };
        span.in_scope(|| context.finish(response.status));
        response
    }

    /// Delete expired tokens. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the token store fails.
    pub fn sweep_expired(&self) -> GatewayResult<usize> {
        Ok(self.tokens.cleanup_expired()?)
    }

    /// Sweep expired tokens every `settings.sweep_interval` until the task
    /// is aborted.
    #[must_use]
    pub fn spawn_token_sweeper(server: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(server.settings.sweep_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                match server.sweep_expired() {
                    Ok(0) => {},
                    Ok(removed) => debug!(removed, "Swept expired tokens"),
                    Err(e) => warn!(error = %e, "Token sweep failed"),
                }
            }
        })
    }
}

impl std::fmt::Debug for AuthorizationServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationServer")
            .field("settings", &self.settings)
            .field("tokens", &self.tokens.len())
            .field("links", &self.links.len())
            .finish_non_exhaustive()
    }
}

fn not_found(request: &InboundRequest) -> GatewayError {
    GatewayError::NotFound {
        method: request.method.clone(),
        url: request.url.clone(),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> GatewayResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| GatewayError::Resource(e.to_string()))
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
