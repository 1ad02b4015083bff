//! Access credentials obtained from a completed install.

use crate::auth::AuthScopes;
use crate::config::ShopDomain;
use chrono::{DateTime, Utc};
use std::fmt;

/// An opaque Admin API access token.
///
/// The value is never printed: `Debug` is masked and there is no `Display`
/// or `Serialize` implementation. Use [`AccessToken::expose`] only where the
/// token is placed into an outbound request header.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps a raw token string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(*****)")
    }
}

/// A credential stored for a shop after a successful handshake.
///
/// # Example
///
/// ```rust
/// use shopify_install::{AccessToken, ShopDomain, StoredCredential};
///
/// let credential = StoredCredential::new(
///     ShopDomain::new("my-store").unwrap(),
///     AccessToken::new("shpat_secret"),
///     "write_products".parse().unwrap(),
/// );
///
/// assert!(!format!("{credential:?}").contains("shpat_secret"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredCredential {
    /// The shop the token was issued for.
    pub shop: ShopDomain,

    /// The access token.
    pub access_token: AccessToken,

    /// The scopes Shopify reported as granted.
    pub scopes: AuthScopes,

    /// When the token was obtained.
    pub obtained_at: DateTime<Utc>,
}

impl StoredCredential {
    /// Creates a credential stamped with the current time.
    #[must_use]
    pub fn new(shop: ShopDomain, access_token: AccessToken, scopes: AuthScopes) -> Self {
        Self {
            shop,
            access_token,
            scopes,
            obtained_at: Utc::now(),
        }
    }
}

// Verify StoredCredential is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<StoredCredential>();
};
