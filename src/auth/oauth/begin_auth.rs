//! Authorization URL generation.
//!
//! The URL carries `client_id`, `scope`, `redirect_uri` and `state`. Scope
//! and redirect URI come from [`InstallConfig`] only; nothing in the inbound
//! request can influence them.
//!
//! # Example
//!
//! ```rust
//! use shopify_install::{InstallConfig, ApiKey, ApiSecretKey, ShopDomain, HostUrl};
//! use shopify_install::auth::oauth::{begin_auth, StateParam};
//!
//! let config = InstallConfig::builder()
//!     .api_key(ApiKey::new("api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("secret").unwrap())
//!     .host(HostUrl::new("https://myapp.example.com").unwrap())
//!     .scopes("write_products,write_themes".parse().unwrap())
//!     .build()
//!     .unwrap();
//!
//! let shop = ShopDomain::new("test-shop").unwrap();
//! let result = begin_auth(&config, &shop, StateParam::new());
//!
//! assert!(result
//!     .auth_url
//!     .starts_with("https://test-shop.myshopify.com/admin/oauth/authorize?"));
//! assert!(result.auth_url.contains("scope=write_products%2Cwrite_themes"));
//! ```

use crate::auth::oauth::state::StateParam;
use crate::config::{InstallConfig, ShopDomain};

/// Result of starting an authorization attempt.
///
/// `state` must be handed to the client (the server sets it as a cookie)
/// and presented again on the callback.
#[derive(Clone, Debug)]
pub struct BeginAuthResult {
    /// The full authorization URL to redirect the merchant to.
    pub auth_url: String,

    /// The state issued for this attempt.
    pub state: StateParam,
}

/// Builds the authorization URL for `shop` carrying `state`.
#[must_use]
pub fn begin_auth(config: &InstallConfig, shop: &ShopDomain, state: StateParam) -> BeginAuthResult {
    let params = [
        ("client_id", config.api_key().as_ref().to_string()),
        ("scope", config.scopes().to_string()),
        ("redirect_uri", config.redirect_uri()),
        ("state", state.to_string()),
    ];

    let query_string = params
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let auth_url = format!(
        "https://{}/admin/oauth/authorize?{}",
        shop.as_ref(),
        query_string
    );

    BeginAuthResult { auth_url, state }
}

// Verify BeginAuthResult is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<BeginAuthResult>();
};
