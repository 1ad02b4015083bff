//! Callback query parameters.

use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::auth::oauth::OAuthError;

/// The full query parameter set Shopify sends to the callback URL.
///
/// Every parameter is kept, not just the ones the handshake reads, because
/// the `hmac` signature covers all of them.
///
/// # Example
///
/// ```rust
/// use shopify_install::auth::oauth::CallbackParams;
///
/// let params = CallbackParams::from_pairs([
///     ("state", "s"),
///     ("hmac", "ignored"),
///     ("code", "abc"),
///     ("shop", "my-store.myshopify.com"),
/// ]);
///
/// assert_eq!(params.code(), Some("abc"));
/// assert_eq!(
///     params.signable_string(),
///     "code=abc&shop=my-store.myshopify.com&state=s"
/// );
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallbackParams {
    params: BTreeMap<String, String>,
}

impl CallbackParams {
    /// Name of the signature parameter, excluded from the signed message.
    pub const HMAC: &'static str = "hmac";

    /// Builds the parameter set from decoded key/value pairs.
    ///
    /// If a key repeats, the last value wins; it is also the value that is
    /// signed, so a repeated key cannot split verification from use.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            params: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parses a raw `application/x-www-form-urlencoded` query string.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::InvalidRequest`] if a key or value carries a
    /// malformed percent escape or does not decode to UTF-8.
    pub fn from_query(query: &str) -> Result<Self, OAuthError> {
        let mut params = Self::default();
        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            params.insert(decode_component(key)?, decode_component(value)?);
        }
        Ok(params)
    }

    /// Returns a parameter value, treating an empty value as absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Returns the `shop` parameter.
    #[must_use]
    pub fn shop(&self) -> Option<&str> {
        self.get("shop")
    }

    /// Returns the `code` parameter.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.get("code")
    }

    /// Returns the `state` parameter.
    #[must_use]
    pub fn state(&self) -> Option<&str> {
        self.get("state")
    }

    /// Returns the `hmac` parameter.
    #[must_use]
    pub fn hmac(&self) -> Option<&str> {
        self.get(Self::HMAC)
    }

    /// Sets a parameter, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    /// Builds the message the `hmac` is computed over: every pair except
    /// `hmac`, sorted by key, as `key=value` joined with `&`.
    #[must_use]
    pub fn signable_string(&self) -> String {
        self.params
            .iter()
            .filter(|(k, _)| k.as_str() != Self::HMAC)
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

fn decode_component(raw: &str) -> Result<String, OAuthError> {
    let malformed = raw.match_indices('%').any(|(i, _)| {
        raw.get(i + 1..i + 3)
            .map_or(true, |hex| !hex.bytes().all(|b| b.is_ascii_hexdigit()))
    });
    if malformed {
        return Err(OAuthError::InvalidRequest { param: "query" });
    }
    urlencoding::decode(&raw.replace('+', " "))
        .map(Cow::into_owned)
        .map_err(|_| OAuthError::InvalidRequest { param: "query" })
}
