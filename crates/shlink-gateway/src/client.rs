//! Client-side request signing.

use serde::Serialize;
use shlink_core::{ClientIdentity, SharedClock, SystemClock};
use shlink_crypto::{BindingHeader, CryptoError, KeyPair, sign_compact};

use crate::error::GatewayResult;
use crate::protocol::ClientDescriptor;
use crate::request::{
    AUTHORIZATION_HEADER, CONTENT_TYPE_HEADER, DETACHED_JWS_HEADER, GNAP_AUTH_SCHEME,
    InboundRequest, JOSE_CONTENT_TYPE, method_has_body,
};

/// Signs requests the way [`RequestAuthenticator`](crate::RequestAuthenticator)
/// verifies them.
///
/// Bodiless methods get the envelope in `Detached-JWS`; other methods send
/// it as an `application/jose` body. A presented token is sent as
/// `Authorization: GNAP <token>` and bound through `ath`.
pub struct RequestSigner {
    key: KeyPair,
    client: ClientIdentity,
    clock: SharedClock,
}

impl RequestSigner {
    /// Signer for `key`, timestamping with the system clock.
    #[must_use]
    pub fn new(key: KeyPair) -> Self {
        Self::with_clock(key, SystemClock::shared())
    }

    /// Signer timestamping with `clock`.
    #[must_use]
    pub fn with_clock(key: KeyPair, clock: SharedClock) -> Self {
        let client = ClientIdentity::from_public_key(key.export_public_key());
        Self { key, client, clock }
    }

    /// The identity the server will see.
    #[must_use]
    pub fn client(&self) -> &ClientIdentity {
        &self.client
    }

    /// The `client` member for a grant request.
    #[must_use]
    pub fn descriptor(&self) -> ClientDescriptor {
        ClientDescriptor::for_client(&self.client)
    }

    /// Sign a request. `body` is serialized as JSON; `None` signs an empty
    /// payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be serialized.
    pub fn sign<T: Serialize + ?Sized>(
        &self,
        method: &str,
        url: &str,
        body: Option<&T>,
        access_token: Option<&str>,
    ) -> GatewayResult<InboundRequest> {
        let method = method.to_ascii_uppercase();
        let payload = match body {
            Some(body) => serde_json::to_vec(body)
                .map_err(|e| CryptoError::MalformedJws(format!("payload: {e}")))?,
            None => Vec::new(),
        };

        let mut header = BindingHeader::new(&method, url, self.clock.now())
            .with_kid(self.client.key_id().as_str());
        if let Some(value) = access_token {
            header = header.with_access_token(value);
        }
        let jws = sign_compact(&header, &payload, &self.key)?;

        let mut request = InboundRequest::new(&method, url);
        if method_has_body(&method) {
            request = request
                .with_header(CONTENT_TYPE_HEADER, JOSE_CONTENT_TYPE)
                .with_body(jws);
        } else {
            request = request.with_header(DETACHED_JWS_HEADER, jws);
        }
        if let Some(value) = access_token {
            request = request.with_header(AUTHORIZATION_HEADER, format!("{GNAP_AUTH_SCHEME} {value}"));
        }
        Ok(request)
    }

    /// Sign a bodiless `GET`.
    ///
    /// # Errors
    ///
    /// As [`sign`](Self::sign).
    pub fn get(&self, url: &str, access_token: Option<&str>) -> GatewayResult<InboundRequest> {
        self.sign::<()>("GET", url, None, access_token)
    }
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("client", self.client.key_id())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shlink_crypto::CompactJws;

    #[test]
    fn test_post_signs_into_body() {
        let signer = RequestSigner::new(KeyPair::generate());
        let request = signer
            .sign("post", "http://localhost:3000/gnap", Some(&serde_json::json!({"a": 1})), None)
            .unwrap();

        assert_eq!(request.method, "POST");
        assert_eq!(request.headers.get("content-type"), Some(JOSE_CONTENT_TYPE));
        assert!(request.headers.get(DETACHED_JWS_HEADER).is_none());
        assert!(request.access_token().is_none());

        let body = String::from_utf8(request.body.unwrap()).unwrap();
        let verified = CompactJws::parse(&body)
            .unwrap()
            .verify(signer.client().public_key())
            .unwrap();
        assert_eq!(verified.header.htm, "POST");
        assert_eq!(verified.header.kid.as_deref(), Some(signer.client().key_id().as_str()));
        assert!(verified.header.ath.is_none());
    }

    #[test]
    fn test_get_uses_detached_header_and_binds_token() {
        let signer = RequestSigner::new(KeyPair::generate());
        let request = signer.get("http://localhost:3000/x", Some("tok")).unwrap();

        assert!(request.body.is_none());
        assert_eq!(request.access_token(), Some("tok"));

        let jws = request.headers.get(DETACHED_JWS_HEADER).unwrap();
        let verified = CompactJws::parse(jws)
            .unwrap()
            .verify(signer.client().public_key())
            .unwrap();
        assert_eq!(
            verified.header.ath,
            Some(shlink_crypto::access_token_hash("tok"))
        );
        assert!(verified.payload.is_empty());
    }
}
