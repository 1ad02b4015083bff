//! HMAC-SHA256 signatures for Shopify OAuth callbacks.
//!
//! # Security
//!
//! Signatures are checked with [`Mac::verify_slice`], which compares in
//! constant time. State values are compared with [`constant_time_compare`].
//! When an old secret is configured it is tried after the primary one, so
//! callbacks signed before a key rotation still verify.
//!
//! # Example
//!
//! ```rust
//! use shopify_install::auth::oauth::hmac::{compute_signature, verify_signature};
//!
//! let message = "code=abc123&shop=example.myshopify.com&state=xyz";
//! let signature = compute_signature(message, "my-api-secret").unwrap();
//! assert_eq!(signature.len(), 64);
//! assert!(verify_signature(message, &signature, "my-api-secret"));
//! assert!(!verify_signature(message, &signature, "other-secret"));
//! ```

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::auth::oauth::CallbackParams;
use crate::config::InstallConfig;

type HmacSha256 = Hmac<Sha256>;

fn keyed(secret: &str) -> Option<HmacSha256> {
    HmacSha256::new_from_slice(secret.as_bytes()).ok()
}

/// Computes the lowercase hex HMAC-SHA256 of `message` under `secret`.
///
/// Returns `None` only if the key is rejected, which HMAC-SHA256 never does.
#[must_use]
pub fn compute_signature(message: &str, secret: &str) -> Option<String> {
    let mut mac = keyed(secret)?;
    mac.update(message.as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Checks a hex-encoded signature over `message` in constant time.
///
/// A signature that is not valid hex never verifies. Hex digits are
/// accepted in either case.
#[must_use]
pub fn verify_signature(message: &str, provided_hex: &str, secret: &str) -> bool {
    let Ok(provided) = hex::decode(provided_hex) else {
        return false;
    };
    let Some(mut mac) = keyed(secret) else {
        return false;
    };
    mac.update(message.as_bytes());
    mac.verify_slice(&provided).is_ok()
}

/// Performs constant-time comparison of two strings.
///
/// Length differences are not hidden, but content never short-circuits.
#[must_use]
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Verifies the `hmac` parameter of a callback against the configured
/// secret, falling back to the old secret if one is configured.
///
/// Returns `false` if `hmac` is absent.
#[must_use]
pub fn verify_callback(params: &CallbackParams, config: &InstallConfig) -> bool {
    let Some(provided) = params.hmac() else {
        return false;
    };
    let message = params.signable_string();

    if verify_signature(&message, provided, config.api_secret_key().as_ref()) {
        return true;
    }

    config
        .old_api_secret_key()
        .is_some_and(|old| verify_signature(&message, provided, old.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKey, ApiSecretKey, HostUrl};

    fn create_test_config(old_secret: Option<&str>) -> InstallConfig {
        let mut builder = InstallConfig::builder()
            .api_key(ApiKey::new("test-api-key").unwrap())
            .api_secret_key(ApiSecretKey::new("primary-secret").unwrap())
            .scopes("write_products".parse().unwrap())
            .host(HostUrl::new("https://app.example.com").unwrap());
        if let Some(old) = old_secret {
            builder = builder.old_api_secret_key(ApiSecretKey::new(old).unwrap());
        }
        builder.build().unwrap()
    }

    fn signed_params(secret: &str) -> CallbackParams {
        let mut params = CallbackParams::from_pairs([
            ("code", "abc"),
            ("shop", "shop-a.example.com"),
            ("state", "0123456789abcdef0123456789abcdef"),
            ("timestamp", "1700000000"),
        ]);
        let signature = compute_signature(&params.signable_string(), secret).unwrap();
        params.insert("hmac", signature);
        params
    }

    #[test]
    fn test_compute_signature_matches_known_vector() {
        // RFC 4231 test case 2
        let signature = compute_signature("what do ya want for nothing?", "Jefe").unwrap();
        assert_eq!(
            signature,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_verify_signature_accepts_uppercase_hex() {
        let signature = compute_signature("msg", "key").unwrap().to_uppercase();
        assert!(verify_signature("msg", &signature, "key"));
    }

    #[test]
    fn test_verify_signature_rejects_garbage() {
        assert!(!verify_signature("msg", "not-hex", "key"));
        assert!(!verify_signature("msg", "", "key"));
        assert!(!verify_signature("msg", "abcd", "key"));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "abcd"));
        assert!(constant_time_compare("", ""));
    }

    #[test]
    fn test_verify_callback_with_primary_secret() {
        let config = create_test_config(None);
        assert!(verify_callback(&signed_params("primary-secret"), &config));
    }

    #[test]
    fn test_verify_callback_falls_back_to_old_secret() {
        let config = create_test_config(Some("old-secret"));
        assert!(verify_callback(&signed_params("old-secret"), &config));
    }

    #[test]
    fn test_verify_callback_rejects_unknown_secret() {
        let config = create_test_config(Some("old-secret"));
        assert!(!verify_callback(&signed_params("attacker-secret"), &config));
    }

    #[test]
    fn test_verify_callback_rejects_missing_hmac() {
        let config = create_test_config(None);
        let params = CallbackParams::from_pairs([("code", "abc"), ("shop", "s.example.com")]);
        assert!(!verify_callback(&params, &config));
    }

    #[test]
    fn test_any_single_character_tamper_fails() {
        let config = create_test_config(None);
        let original = signed_params("primary-secret");

        for key in ["code", "shop", "state", "timestamp"] {
            let value = original.get(key).unwrap().to_string();
            for i in 0..value.len() {
                let mut chars: Vec<char> = value.chars().collect();
                chars[i] = if chars[i] == 'x' { 'y' } else { 'x' };
                let mut tampered = original.clone();
                tampered.insert(key, chars.into_iter().collect::<String>());
                assert!(
                    !verify_callback(&tampered, &config),
                    "tampering {key}[{i}] was not detected"
                );
            }
        }
    }
}
