//! Validated newtype wrappers for configuration values.
//!
//! These wrappers validate their contents on construction. A `ShopDomain` in
//! particular is the only way a tenant string reaches an outbound URL, so its
//! constructor is the hostname gate for the whole crate.

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A validated Shopify API key (the OAuth client identifier).
///
/// # Example
///
/// ```rust
/// use shopify_install::ApiKey;
///
/// let key = ApiKey::new("my-api-key").unwrap();
/// assert_eq!(key.as_ref(), "my-api-key");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Creates a new validated API key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyApiKey`] if the key is empty.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self(key))
    }
}

impl AsRef<str> for ApiKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A validated Shopify API secret key, used both as the OAuth client secret
/// and as the HMAC key for callback signatures.
///
/// The `Debug` implementation masks the value.
///
/// ```rust
/// use shopify_install::ApiSecretKey;
///
/// let secret = ApiSecretKey::new("my-secret").unwrap();
/// assert_eq!(format!("{:?}", secret), "ApiSecretKey(*****)");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ApiSecretKey(String);

impl ApiSecretKey {
    /// Creates a new validated API secret key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyApiSecretKey`] if the key is empty.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ConfigError::EmptyApiSecretKey);
        }
        Ok(Self(key))
    }
}

impl AsRef<str> for ApiSecretKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiSecretKey(*****)")
    }
}

/// A shop (tenant) hostname.
///
/// Construction rejects anything that is not a bare DNS hostname: schemes,
/// paths, ports, credentials, query strings, whitespace, IP literals and
/// malformed labels. A single label is normalized to `<label>.myshopify.com`.
///
/// Whether the host belongs to an allowed provider domain is a separate check,
/// see [`ShopDomain::is_within`].
///
/// ```rust
/// use shopify_install::ShopDomain;
///
/// let domain = ShopDomain::new("my-store").unwrap();
/// assert_eq!(domain.as_ref(), "my-store.myshopify.com");
///
/// assert!(ShopDomain::new("https://my-store.myshopify.com").is_err());
/// assert!(ShopDomain::new("evil.com/admin").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShopDomain(String);

impl ShopDomain {
    /// Domain appended to single-label shop names.
    pub const DEFAULT_SUFFIX: &'static str = "myshopify.com";

    const MAX_LEN: usize = 253;
    const MAX_LABEL_LEN: usize = 63;

    /// Creates a new validated shop domain.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidShopDomain`] if the value is not a
    /// plausible hostname.
    pub fn new(domain: impl Into<String>) -> Result<Self, ConfigError> {
        let raw = domain.into();
        let domain = raw.trim().to_ascii_lowercase();
        let invalid = || ConfigError::InvalidShopDomain { domain: raw.clone() };

        if domain.is_empty() {
            return Err(invalid());
        }

        let full = if domain.contains('.') {
            domain
        } else {
            format!("{domain}.{}", Self::DEFAULT_SUFFIX)
        };

        if full.len() > Self::MAX_LEN {
            return Err(invalid());
        }

        let labels: Vec<&str> = full.split('.').collect();
        if !labels.iter().all(|label| Self::is_valid_label(label)) {
            return Err(invalid());
        }

        // Top-level label must not be numeric, which also rules out IPv4 literals.
        if labels
            .last()
            .is_some_and(|tld| tld.chars().all(|c| c.is_ascii_digit()))
        {
            return Err(invalid());
        }

        Ok(Self(full))
    }

    /// Returns the first label of the domain (`my-store` for
    /// `my-store.myshopify.com`).
    #[must_use]
    pub fn shop_name(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }

    /// Returns `true` if this domain is a strict subdomain of one of `suffixes`.
    ///
    /// ```rust
    /// use shopify_install::ShopDomain;
    ///
    /// let shop = ShopDomain::new("a.myshopify.com").unwrap();
    /// assert!(shop.is_within(&["myshopify.com".to_string()]));
    /// assert!(!shop.is_within(&["shopify.com".to_string()]));
    /// ```
    #[must_use]
    pub fn is_within(&self, suffixes: &[String]) -> bool {
        suffixes.iter().any(|suffix| {
            self.0
                .strip_suffix(suffix.as_str())
                .and_then(|prefix| prefix.strip_suffix('.'))
                .is_some_and(|prefix| !prefix.is_empty())
        })
    }

    fn is_valid_label(label: &str) -> bool {
        !label.is_empty()
            && label.len() <= Self::MAX_LABEL_LEN
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ShopDomain {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ShopDomain {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(de::Error::custom)
    }
}

/// The externally reachable base URL of this application.
///
/// Must be an absolute `https://` URL without query or fragment. A trailing
/// slash is removed so that paths can be appended directly.
///
/// ```rust
/// use shopify_install::HostUrl;
///
/// let url = HostUrl::new("https://myapp.example.com/").unwrap();
/// assert_eq!(url.as_ref(), "https://myapp.example.com");
/// assert_eq!(url.host_name(), "myapp.example.com");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostUrl {
    url: String,
    host_start: usize,
    host_end: usize,
}

impl HostUrl {
    const SCHEME: &'static str = "https://";

    /// Creates a new validated host URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidHostUrl`] if the URL is malformed and
    /// [`ConfigError::InsecureHostUrl`] if it does not use `https`.
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into();
        let url = url.trim().trim_end_matches('/').to_string();
        let invalid = || ConfigError::InvalidHostUrl { url: url.clone() };

        let scheme_end = url.find("://").ok_or_else(invalid)?;
        let scheme = &url[..scheme_end];
        if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid());
        }
        if !url[..scheme_end + 3].eq_ignore_ascii_case(Self::SCHEME) {
            return Err(ConfigError::InsecureHostUrl { url: url.clone() });
        }
        if url.contains(['?', '#']) {
            return Err(invalid());
        }

        let host_start = scheme_end + 3;
        let remainder = &url[host_start..];
        let host_end = remainder
            .find([':', '/'])
            .map_or(url.len(), |i| host_start + i);

        if host_end == host_start || url[host_start..host_end].contains('@') {
            return Err(invalid());
        }

        Ok(Self {
            url,
            host_start,
            host_end,
        })
    }

    /// Returns the host name portion of the URL.
    #[must_use]
    pub fn host_name(&self) -> &str {
        &self.url[self.host_start..self.host_end]
    }

    /// Returns this URL with `path` appended.
    #[must_use]
    pub fn join(&self, path: &str) -> String {
        format!("{}/{}", self.url, path.trim_start_matches('/'))
    }
}

impl AsRef<str> for HostUrl {
    fn as_ref(&self) -> &str {
        &self.url
    }
}
