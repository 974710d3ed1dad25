//! Error types for the gateway.

use shlink_capabilities::CapabilityError;
use shlink_crypto::CryptoError;
use shlink_policy::{ClaimError, PolicyError};
use thiserror::Error;

/// Why a signed request failed authentication.
///
/// Authentication failures are terminal and never mutate state.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Neither the body nor the `Detached-JWS` header carried an envelope.
    #[error("no signed envelope in body or Detached-JWS header")]
    MissingSignature,

    /// The envelope is not a decodable compact JWS, or its payload is not JSON.
    #[error("malformed signed envelope: {0}")]
    MalformedEnvelope(String),

    /// Bootstrap request without `client.key.jwk` in its payload.
    #[error("no client key in request payload")]
    MissingClientKey,

    /// The declared client key is not a usable Ed25519 JWK.
    #[error("unusable client key: {0}")]
    InvalidClientKey(String),

    /// `Authorization: GNAP` named a token the store does not hold.
    #[error("access token not recognized")]
    UnknownAccessToken,

    /// The signature, `alg` or `typ` did not verify.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// The signed `htm` differs from the request method.
    #[error("signed method {signed} does not match request method {actual}")]
    MethodMismatch {
        /// Method in the signed header.
        signed: String,
        /// Method of the request.
        actual: String,
    },

    /// The signed `uri` differs from the request URL.
    #[error("signed uri {signed} does not match request url {actual}")]
    UriMismatch {
        /// URI in the signed header.
        signed: String,
        /// Full URL of the request.
        actual: String,
    },

    /// The signed `created` is outside the freshness window.
    #[error("request created {skew_secs}s away from now, outside the {window_secs}s window")]
    StaleRequest {
        /// Signed creation time, epoch seconds.
        created: i64,
        /// Absolute distance from the server clock.
        skew_secs: i64,
        /// Allowed distance.
        window_secs: i64,
    },

    /// A token was presented but `ath` does not hash to it.
    #[error("signature is not bound to the presented access token")]
    TokenBindingMismatch,

    /// The token store failed while introspecting.
    #[error("token store error: {0}")]
    Store(#[from] CapabilityError),
}

/// Result type for request authentication.
pub type AuthResult<T> = Result<T, AuthError>;

/// Gateway error type.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request signature did not verify.
    #[error("authentication failed: {0}")]
    Authentication(#[from] AuthError),

    /// The resource access gate refused the presented token.
    #[error("{0}")]
    Capability(#[from] CapabilityError),

    /// Every claim in a grant request was refused and nothing was granted.
    #[error("claim rejected: {}", join_reasons(.reasons))]
    ClaimRejected {
        /// One entry per refused link.
        reasons: Vec<ClaimError>,
    },

    /// A policy location lies outside the package being shared.
    #[error("location {location} is outside package {package_id}")]
    LocationOutsidePackage {
        /// Offending location.
        location: String,
        /// The package named in the request path.
        package_id: String,
    },

    /// The link id is already bound to another owner's package.
    #[error("link {package_id} belongs to another namespace")]
    ForeignPackage {
        /// The contested package id.
        package_id: String,
    },

    /// Link terms failed validation, or the registry failed.
    #[error("policy error: {0}")]
    Policy(#[from] PolicyError),

    /// The verified payload is not the expected request document.
    #[error("invalid request: {0}")]
    BadRequest(String),

    /// No operation serves this method and URL.
    #[error("no route for {method} {url}")]
    NotFound {
        /// Request method.
        method: String,
        /// Request URL.
        url: String,
    },

    /// The resource collaborator has nothing at this location.
    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    /// The resource collaborator failed.
    #[error("resource provider error: {0}")]
    Resource(String),

    /// Signing a request failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Configuration could not be turned into server settings.
    #[error("configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    /// HTTP status code for this error.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::Authentication(AuthError::Store(_)) => 500,
            Self::Authentication(_) | Self::Capability(CapabilityError::TokenNotPresented) => 401,
            Self::Capability(
                CapabilityError::AccessDenied { .. } | CapabilityError::TokenExpired { .. },
            )
            | Self::LocationOutsidePackage { .. }
            | Self::ForeignPackage { .. } => 403,
            Self::ClaimRejected { .. } => 409,
            Self::Policy(PolicyError::InvalidTerms { .. }) | Self::BadRequest(_) => 400,
            Self::NotFound { .. } | Self::ResourceNotFound(_) => 404,
            Self::Capability(_)
            | Self::Policy(_)
            | Self::Resource(_)
            | Self::Crypto(_)
            | Self::Config(_) => 500,
        }
    }

    /// Short machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Authentication(_) => "authentication_failed",
            Self::Capability(CapabilityError::TokenNotPresented) => "token_required",
            Self::Capability(CapabilityError::TokenExpired { .. }) => "token_expired",
            Self::Capability(CapabilityError::AccessDenied { .. }) => "access_denied",
            Self::ClaimRejected { .. } => "claim_rejected",
            Self::LocationOutsidePackage { .. } | Self::ForeignPackage { .. } => "outside_package",
            Self::Policy(PolicyError::InvalidTerms { .. }) | Self::BadRequest(_) => "invalid_request",
            Self::NotFound { .. } => "not_found",
            Self::ResourceNotFound(_) => "resource_not_found",
            Self::Capability(_)
            | Self::Policy(_)
            | Self::Resource(_)
            | Self::Crypto(_)
            | Self::Config(_) => "internal_error",
        }
    }
}

fn join_reasons(reasons: &[ClaimError]) -> String {
    reasons
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;
    use shlink_core::AccessType;

    #[test]
    fn test_status_mapping() {
        assert_eq!(GatewayError::from(AuthError::MissingSignature).status(), 401);
        assert_eq!(
            GatewayError::from(CapabilityError::AccessDenied {
                required: AccessType::Read,
                location: "x".to_owned(),
            })
            .status(),
            403
        );
        assert_eq!(
            GatewayError::ClaimRejected {
                reasons: vec![ClaimError::LinkInactive {
                    link_id: "p".to_owned()
                }]
            }
            .status(),
            409
        );
        assert_eq!(GatewayError::BadRequest("x".to_owned()).status(), 400);
        assert_eq!(
            GatewayError::NotFound {
                method: "GET".to_owned(),
                url: "/".to_owned()
            }
            .status(),
            404
        );
    }

    #[test]
    fn test_claim_rejected_lists_every_reason() {
        let err = GatewayError::ClaimRejected {
            reasons: vec![
                ClaimError::LinkInactive {
                    link_id: "a".to_owned(),
                },
                ClaimError::ClaimLimitReached {
                    link_id: "b".to_owned(),
                    claim_limit: 1,
                },
            ],
        };
        let message = err.to_string();
        assert!(message.contains("link is inactive: a"));
        assert!(message.contains("claim limit of 1 reached for link b"));
    }
}
