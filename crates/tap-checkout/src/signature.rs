//! HMAC-SHA256 signatures for webhook bodies, plus constant-time token
//! comparison for bearer guards.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute the hex-encoded HMAC-SHA256 of a body using the shared secret.
pub fn compute(secret: &[u8], body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(body);
    hex::encode(&mac.finalize().into_bytes())
}

/// Verify a hex-encoded signature against the raw body.
///
/// Comparison is constant-time via the hmac crate. A signature that is not
/// valid hex is compared against zeros so the invalid-hex path does not
/// short-circuit.
pub fn verify(secret: &[u8], body: &[u8], signature: &str) -> bool {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(body);
    let expected = hex::decode(signature).unwrap_or_else(|| vec![0u8; 32]);
    mac.verify_slice(&expected).is_ok()
}

/// Constant-time byte comparison for bearer-token checks.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    use subtle::ConstantTimeEq;
    a.len() == b.len() && a.ct_eq(b).unwrap_u8() == 1
}

mod hex {
    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    pub fn decode(s: &str) -> Option<Vec<u8>> {
        if s.len() % 2 != 0 || !s.is_ascii() {
            return None;
        }
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_roundtrip() {
        let sig = compute(b"whsec_test", b"{\"object\":{\"id\":\"auth_1\"}}");
        assert!(verify(b"whsec_test", b"{\"object\":{\"id\":\"auth_1\"}}", &sig));
    }

    #[test]
    fn wrong_secret_fails() {
        let sig = compute(b"whsec_a", b"payload");
        assert!(!verify(b"whsec_b", b"payload", &sig));
    }

    #[test]
    fn tampered_body_fails() {
        let sig = compute(b"whsec_test", b"payload");
        assert!(!verify(b"whsec_test", b"payload2", &sig));
    }

    #[test]
    fn invalid_hex_fails_cleanly() {
        assert!(!verify(b"whsec_test", b"payload", "zz-not-hex"));
        assert!(!verify(b"whsec_test", b"payload", "abc"));
    }

    #[test]
    fn constant_time_eq_basics() {
        assert!(constant_time_eq(b"token", b"token"));
        assert!(!constant_time_eq(b"token", b"token2"));
        assert!(!constant_time_eq(b"token", b"nekot"));
    }
}
