//! Request and response documents of the three operations.

use serde::{Deserialize, Serialize};
use shlink_capabilities::AccessToken;
use shlink_core::{AccessRequestItem, ClientIdentity, RarItem};
use shlink_crypto::Jwk;
use std::fmt;

/// The only supported `client.proof` method.
pub const PROOF_JWS: &str = "jws";

/// `status` of a successful policy replacement.
pub const POLICY_UPDATED_STATUS: &str = "PUT new policy";

/// Path of the grant endpoint below the public URL.
pub const GRANT_PATH: &str = "/gnap";

/// Body of `POST /gnap`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRequest {
    /// Requested rights.
    pub access_token: AccessTokenRequest,
    /// The requesting client and its key.
    pub client: ClientDescriptor,
    /// Link-sharing extension (PIN).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shclink: Option<ShclinkExtension>,
}

impl GrantRequest {
    /// Request `access` for `client`.
    #[must_use]
    pub fn new(access: Vec<AccessRequestItem>, client: ClientDescriptor) -> Self {
        Self {
            access_token: AccessTokenRequest { access },
            client,
            shclink: None,
        }
    }

    /// Supply a PIN for PIN-protected links.
    #[must_use]
    pub fn with_pin(mut self, pin: impl Into<String>) -> Self {
        self.shclink = Some(ShclinkExtension {
            pin: Some(pin.into()),
        });
        self
    }

    /// The supplied PIN, if any.
    #[must_use]
    pub fn pin(&self) -> Option<&str> {
        self.shclink.as_ref().and_then(|ext| ext.pin.as_deref())
    }
}

/// The `access_token` member of a grant request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenRequest {
    /// Items and references, evaluated in order.
    pub access: Vec<AccessRequestItem>,
}

/// The `client` member of a grant request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDescriptor {
    /// Proof method; always `jws`.
    pub proof: String,
    /// The client's public key.
    pub key: ClientKey,
    /// Display information, informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<ClientDisplay>,
}

impl ClientDescriptor {
    /// Descriptor for `client`'s key.
    #[must_use]
    pub fn for_client(client: &ClientIdentity) -> Self {
        Self {
            proof: PROOF_JWS.to_owned(),
            key: ClientKey { jwk: client.jwk() },
            display: None,
        }
    }

    /// Attach a display name.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display = Some(ClientDisplay {
            name: Some(name.into()),
            uri: None,
        });
        self
    }
}

/// `client.key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientKey {
    /// Public key as a JWK.
    pub jwk: Jwk,
}

/// `client.display`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDisplay {
    /// Human-readable name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Homepage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

/// `shclink` grant request extension.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShclinkExtension {
    /// PIN for a PIN-protected link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
}

impl fmt::Debug for ShclinkExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShclinkExtension")
            .field("pin", &self.pin.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Body of a successful `POST /gnap` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantResponse {
    /// The issued token.
    pub access_token: IssuedToken,
}

impl From<&AccessToken> for GrantResponse {
    fn from(token: &AccessToken) -> Self {
        Self {
            access_token: IssuedToken {
                value: token.value.clone(),
                access: token.granted_access.clone(),
            },
        }
    }
}

impl GrantResponse {
    /// Locations of every granted item of `type`, in grant order.
    #[must_use]
    pub fn locations_of(&self, access_type: shlink_core::AccessType) -> Vec<&str> {
        self.access_token
            .access
            .iter()
            .filter(|item| item.access_type == access_type)
            .flat_map(|item| item.locations.iter().map(String::as_str))
            .collect()
    }
}

/// `access_token` member of a grant response.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedToken {
    /// Token value to present as `Authorization: GNAP <value>`.
    pub value: String,
    /// Granted items.
    pub access: Vec<RarItem>,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("value", &shlink_capabilities::token_fingerprint(&self.value))
            .field("access", &self.access)
            .finish()
    }
}

/// Body of `PUT .../{package}/policy`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRequest {
    /// PIN claimants must supply.
    #[serde(default, alias = "needPin", skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
    /// How many claims the link allows.
    #[serde(rename = "claimLimit")]
    pub claim_limit: u32,
    /// Data locations claimants may read.
    pub locations: Vec<String>,
}

impl fmt::Debug for PolicyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyRequest")
            .field("pin", &self.pin.as_ref().map(|_| "[REDACTED]"))
            .field("claim_limit", &self.claim_limit)
            .field("locations", &self.locations)
            .finish()
    }
}

/// Body of a successful policy replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyResponse {
    /// Always [`POLICY_UPDATED_STATUS`].
    pub status: String,
    /// Where and how to claim the link.
    pub gnap: ClaimEndpoint,
}

impl PolicyResponse {
    /// Confirmation for `package_id`, claimable at `{public_url}/gnap`.
    #[must_use]
    pub fn new(public_url: &str, package_id: impl Into<String>) -> Self {
        Self {
            status: POLICY_UPDATED_STATUS.to_owned(),
            gnap: ClaimEndpoint {
                url: format!("{public_url}{GRANT_PATH}"),
                access: package_id.into(),
            },
        }
    }
}

/// The claim descriptor a link encodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimEndpoint {
    /// Grant endpoint URL.
    pub url: String,
    /// Reference to request (the link id).
    pub access: String,
}
