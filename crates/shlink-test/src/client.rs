//! Named signing clients for tests.

use shlink_core::{AccessRequestItem, ClientIdentity, SharedClock};
use shlink_crypto::KeyPair;
use shlink_gateway::{GatewayResult, GrantRequest, InboundRequest, RequestSigner};

use crate::fixtures::TEST_PUBLIC_URL;

/// A client with its own key, signing on the harness clock.
#[derive(Debug)]
pub struct TestClient {
    /// Label used in assertion messages.
    pub name: String,
    signer: RequestSigner,
}

impl TestClient {
    /// Client with a fresh key.
    #[must_use]
    pub fn new(name: impl Into<String>, clock: SharedClock) -> Self {
        Self {
            name: name.into(),
            signer: RequestSigner::with_clock(KeyPair::generate(), clock),
        }
    }

    /// The identity the server derives from this client's key.
    #[must_use]
    pub fn identity(&self) -> &ClientIdentity {
        self.signer.client()
    }

    /// The key thumbprint as a string.
    #[must_use]
    pub fn key_id(&self) -> &str {
        self.identity().key_id().as_str()
    }

    /// The underlying signer.
    #[must_use]
    pub fn signer(&self) -> &RequestSigner {
        &self.signer
    }

    /// A signed `POST /gnap` for `access`.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be serialized.
    pub fn grant_request(
        &self,
        access: Vec<AccessRequestItem>,
        pin: Option<&str>,
    ) -> GatewayResult<InboundRequest> {
        let mut body = GrantRequest::new(access, self.signer.descriptor());
        if let Some(pin) = pin {
            body = body.with_pin(pin);
        }
        self.signer
            .sign("POST", &format!("{TEST_PUBLIC_URL}/gnap"), Some(&body), None)
    }

    /// A signed request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be serialized.
    pub fn send<T: serde::Serialize + ?Sized>(
        &self,
        method: &str,
        url: &str,
        body: &T,
        token: Option<&str>,
    ) -> GatewayResult<InboundRequest> {
        self.signer.sign(method, url, Some(body), token)
    }

    /// A signed `GET` presenting `token`.
    ///
    /// # Errors
    ///
    /// Never fails for bodiless requests; the signature matches
    /// [`RequestSigner::get`].
    pub fn get(&self, url: &str, token: &str) -> GatewayResult<InboundRequest> {
        self.signer.get(url, Some(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shlink_core::ManualClock;

    #[test]
    fn test_clients_have_distinct_keys() {
        let clock = ManualClock::new(0);
        let a = TestClient::new("a", clock.shared());
        let b = TestClient::new("b", clock.shared());
        assert_ne!(a.key_id(), b.key_id());
        assert_eq!(a.name, "a");
    }

    #[test]
    fn test_grant_request_carries_pin() {
        let client = TestClient::new("a", ManualClock::new(0).shared());
        let request = client
            .grant_request(vec![AccessRequestItem::Reference("link".to_owned())], Some("1234"))
            .unwrap();
        assert_eq!(request.method, "POST");
        assert_eq!(request.url, format!("{TEST_PUBLIC_URL}/gnap"));
        assert!(request.body.is_some());
    }
}
