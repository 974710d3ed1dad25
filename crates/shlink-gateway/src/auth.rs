//! Proof-of-possession request authentication.
//!
//! Every request carries a compact JWS whose protected header binds it to
//! the HTTP method (`htm`), the full URL (`uri`), a creation time
//! (`created`) and, when a token is presented, the token hash (`ath`).
//!
//! The verification key comes from one of two places:
//!
//! - **Token path.** With `Authorization: GNAP <token>`, the key is the one
//!   the token was issued to.
//! - **Bootstrap path.** Otherwise the key is read from `client.key.jwk` in
//!   the not-yet-verified payload. This is a self-asserted key: a valid
//!   signature proves possession of it and nothing more. Authority comes
//!   only from policy evaluation of the now-proven key, never from signature
//!   success alone.

use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use shlink_capabilities::{AccessToken, AccessTokenStore, Introspection, ResourceAccessGate};
use shlink_core::{AccessType, ClientIdentity, SharedClock};
use shlink_crypto::{
    BindingHeader, CompactJws, GNAP_BINDING_TYP, Jwk, access_token_hash, constant_time_eq,
};
use tracing::{debug, warn};

use crate::error::{AuthError, AuthResult, GatewayError, GatewayResult};
use crate::request::InboundRequest;

/// Default allowed distance between `created` and the server clock.
pub const DEFAULT_FRESHNESS_WINDOW_SECS: i64 = 300;

/// A request whose signature and binding checks all passed.
#[derive(Debug, Clone)]
pub struct AuthenticatedRequest {
    /// The client whose key verified the signature.
    pub client: ClientIdentity,
    /// The verified protected header.
    pub header: BindingHeader,
    /// The verified payload; `None` when the signed payload was empty.
    pub payload: Option<serde_json::Value>,
    /// The presented token, if any.
    pub token: Option<AccessToken>,
    /// Whether the presented token is unexpired.
    pub token_valid: bool,
}

impl AuthenticatedRequest {
    /// Deserialize the verified payload.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::BadRequest`] if there is no payload or it does
    /// not have the expected shape.
    pub fn parse_payload<T: DeserializeOwned>(&self) -> GatewayResult<T> {
        let payload = self
            .payload
            .as_ref()
            .ok_or_else(|| GatewayError::BadRequest("signed payload is empty".to_owned()))?;
        T::deserialize(payload).map_err(|e| GatewayError::BadRequest(e.to_string()))
    }

    /// Check the presented token against the resource access gate.
    ///
    /// # Errors
    ///
    /// Returns the gate's [`CapabilityError`](shlink_capabilities::CapabilityError)
    /// when no token was presented, it expired, or it does not cover
    /// `location` with `required`.
    pub fn authorize(&self, required: AccessType, location: &str) -> GatewayResult<&AccessToken> {
        let token = self
            .token
            .as_ref()
            .ok_or(shlink_capabilities::CapabilityError::TokenNotPresented)?;
        let introspection = Introspection {
            token: Some(token.clone()),
            valid: self.token_valid,
        };
        ResourceAccessGate::check(&introspection, required, location)?;
        Ok(token)
    }
}

/// Verifies signed requests.
#[derive(Debug, Clone)]
pub struct RequestAuthenticator {
    tokens: Arc<AccessTokenStore>,
    clock: SharedClock,
    freshness_window_secs: i64,
}

impl RequestAuthenticator {
    /// Authenticator resolving tokens in `tokens` and judging freshness by `clock`.
    #[must_use]
    pub fn new(tokens: Arc<AccessTokenStore>, clock: SharedClock) -> Self {
        Self {
            tokens,
            clock,
            freshness_window_secs: DEFAULT_FRESHNESS_WINDOW_SECS,
        }
    }

    /// Set the freshness window.
    #[must_use]
    pub fn with_freshness_window(mut self, secs: i64) -> Self {
        self.freshness_window_secs = secs;
        self
    }

    /// The freshness window in seconds.
    #[must_use]
    pub fn freshness_window_secs(&self) -> i64 {
        self.freshness_window_secs
    }

    /// Authenticate `request`. There is no partial success: any failed
    /// check rejects the whole request.
    ///
    /// # Errors
    ///
    /// Returns the [`AuthError`] of the first failed check.
    pub fn authenticate(&self, request: &InboundRequest) -> AuthResult<AuthenticatedRequest> {
        let result = self.verify(request);
        if let Err(e) = &result {
            warn!(method = %request.method, url = %request.url, error = %e, "Request authentication failed");
        }
        result
    }

    fn verify(&self, request: &InboundRequest) -> AuthResult<AuthenticatedRequest> {
        let envelope = request
            .envelope()
            .map_err(AuthError::MalformedEnvelope)?
            .ok_or(AuthError::MissingSignature)?;
        let jws = CompactJws::parse(envelope)
            .map_err(|e| AuthError::MalformedEnvelope(e.to_string()))?;

        let presented = request.access_token();
        let (client, introspection) = match presented {
            Some(value) => {
                let introspection = self.tokens.introspect(value)?;
                let client = introspection
                    .token
                    .as_ref()
                    .map(|token| token.bound_client.clone())
                    .ok_or(AuthError::UnknownAccessToken)?;
                (client, Some(introspection))
            },
            None => (declared_client(&jws)?, None),
        };

        let verified = jws
            .verify(client.public_key())
            .map_err(|e| AuthError::InvalidSignature(e.to_string()))?;
        let header = verified.header;

        if header.typ != GNAP_BINDING_TYP {
            return Err(AuthError::InvalidSignature(format!(
                "unexpected typ {:?}",
                header.typ
            )));
        }
        if header.htm != request.method {
            return Err(AuthError::MethodMismatch {
                signed: header.htm,
                actual: request.method.clone(),
            });
        }
        if header.uri != request.url {
            return Err(AuthError::UriMismatch {
                signed: header.uri,
                actual: request.url.clone(),
            });
        }

        let skew_secs = self
            .clock
            .now()
            .saturating_sub(header.created)
            .saturating_abs();
        if skew_secs > self.freshness_window_secs {
            return Err(AuthError::StaleRequest {
                created: header.created,
                skew_secs,
                window_secs: self.freshness_window_secs,
            });
        }

        if let Some(value) = presented {
            let bound = header
                .ath
                .as_deref()
                .is_some_and(|ath| constant_time_eq(ath, &access_token_hash(value)));
            if !bound {
                return Err(AuthError::TokenBindingMismatch);
            }
        }

        let payload = if verified.payload.is_empty() {
            None
        } else {
            Some(
                serde_json::from_slice(&verified.payload)
                    .map_err(|e| AuthError::MalformedEnvelope(format!("payload: {e}")))?,
            )
        };

        let (token, token_valid) = match introspection {
            Some(Introspection { token, valid }) => (token, valid),
            None => (None, false),
        };

        debug!(
            client = %client.key_id(),
            method = %request.method,
            url = %request.url,
            with_token = token.is_some(),
            "Request authenticated"
        );

        Ok(AuthenticatedRequest {
            client,
            header,
            payload,
            token,
            token_valid,
        })
    }
}

/// Read the self-declared key from `client.key.jwk` of an unverified payload.
fn declared_client(jws: &CompactJws) -> AuthResult<ClientIdentity> {
    let bytes = jws
        .unverified_payload()
        .map_err(|e| AuthError::MalformedEnvelope(e.to_string()))?;
    let payload: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::MalformedEnvelope(format!("payload: {e}")))?;
    let jwk_value = payload
        .pointer("/client/key/jwk")
        .ok_or(AuthError::MissingClientKey)?;
    let jwk = Jwk::deserialize(jwk_value).map_err(|e| AuthError::InvalidClientKey(e.to_string()))?;
    ClientIdentity::from_jwk(&jwk).map_err(|e| AuthError::InvalidClientKey(e.to_string()))
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
