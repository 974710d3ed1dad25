//! Unpadded base64url, the only encoding JOSE objects use.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::error::{CryptoError, CryptoResult};

/// Encode bytes as unpadded base64url.
#[must_use]
pub fn b64url_encode(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode unpadded base64url.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidBase64Encoding`] on malformed input.
pub fn b64url_decode(s: &str) -> CryptoResult<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(s)
        .map_err(|_| CryptoError::InvalidBase64Encoding)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_padding_and_url_alphabet() {
        let encoded = b64url_encode([0xfb, 0xff]);
        assert_eq!(encoded, "-_8");
        assert_eq!(b64url_decode(&encoded).unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn test_rejects_standard_padding() {
        assert!(b64url_decode("-_8=").is_err());
        assert!(b64url_decode("+/8").is_err());
    }
}
