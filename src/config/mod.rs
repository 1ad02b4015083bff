//! Configuration for the install backend.
//!
//! # Overview
//!
//! - [`InstallConfig`]: everything the handshake needs, immutable once built
//! - [`InstallConfigBuilder`]: fluent builder that fails closed on missing values
//! - [`EnvSettings`]: process settings loaded from the environment
//! - Validated newtypes: [`ApiKey`], [`ApiSecretKey`], [`ShopDomain`], [`HostUrl`]
//! - [`ApiVersion`]: the Admin API version used by downstream calls
//!
//! # Example
//!
//! ```rust
//! use shopify_install::{InstallConfig, ApiKey, ApiSecretKey, HostUrl};
//!
//! let config = InstallConfig::builder()
//!     .api_key(ApiKey::new("my-api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("my-secret").unwrap())
//!     .scopes("write_products,write_themes".parse().unwrap())
//!     .host(HostUrl::new("https://myapp.example.com").unwrap())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.redirect_uri(), "https://myapp.example.com/auth/callback");
//! ```

mod env;
mod newtypes;
mod version;

pub use env::{EnvSettings, LogFormat};
pub use newtypes::{ApiKey, ApiSecretKey, HostUrl, ShopDomain};
pub use version::ApiVersion;

use std::time::Duration;

use crate::auth::AuthScopes;
use crate::error::ConfigError;

/// Path on this application that receives the OAuth callback.
pub const CALLBACK_PATH: &str = "/auth/callback";

/// Default timeout for the server-to-server token exchange.
pub const DEFAULT_TOKEN_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default lifetime of an issued anti-forgery state.
pub const DEFAULT_PENDING_AUTH_TTL: Duration = Duration::from_secs(600);

/// Immutable configuration for the authorization handshake.
///
/// The scope list and callback URI are static configuration; nothing in an
/// inbound request can change them.
///
/// # Key Rotation
///
/// When `old_api_secret_key` is set, callback signatures made with the
/// previous secret still verify, so in-flight installs survive a rotation.
#[derive(Clone, Debug)]
pub struct InstallConfig {
    api_key: ApiKey,
    api_secret_key: ApiSecretKey,
    old_api_secret_key: Option<ApiSecretKey>,
    scopes: AuthScopes,
    host: HostUrl,
    allowed_shop_domains: Vec<String>,
    api_version: ApiVersion,
    is_embedded: bool,
    token_exchange_timeout: Duration,
    pending_auth_ttl: Duration,
    app_handle: Option<String>,
}

impl InstallConfig {
    /// Creates a new builder for constructing an `InstallConfig`.
    #[must_use]
    pub fn builder() -> InstallConfigBuilder {
        InstallConfigBuilder::new()
    }

    /// Returns the API key (OAuth client identifier).
    #[must_use]
    pub const fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    /// Returns the API secret key.
    #[must_use]
    pub const fn api_secret_key(&self) -> &ApiSecretKey {
        &self.api_secret_key
    }

    /// Returns the previous API secret key, if configured.
    #[must_use]
    pub const fn old_api_secret_key(&self) -> Option<&ApiSecretKey> {
        self.old_api_secret_key.as_ref()
    }

    /// Returns the requested OAuth scopes.
    #[must_use]
    pub const fn scopes(&self) -> &AuthScopes {
        &self.scopes
    }

    /// Returns the externally reachable base URL.
    #[must_use]
    pub const fn host(&self) -> &HostUrl {
        &self.host
    }

    /// Returns the full callback URL registered with Shopify.
    #[must_use]
    pub fn redirect_uri(&self) -> String {
        self.host.join(CALLBACK_PATH)
    }

    /// Returns the provider domains a shop must belong to.
    #[must_use]
    pub fn allowed_shop_domains(&self) -> &[String] {
        &self.allowed_shop_domains
    }

    /// Returns the Admin API version.
    #[must_use]
    pub const fn api_version(&self) -> &ApiVersion {
        &self.api_version
    }

    /// Returns whether the app is embedded in the Shopify admin.
    #[must_use]
    pub const fn is_embedded(&self) -> bool {
        self.is_embedded
    }

    /// Returns the timeout applied to the token exchange call.
    #[must_use]
    pub const fn token_exchange_timeout(&self) -> Duration {
        self.token_exchange_timeout
    }

    /// Returns how long an issued state stays valid.
    #[must_use]
    pub const fn pending_auth_ttl(&self) -> Duration {
        self.pending_auth_ttl
    }

    /// Returns the app handle used to redirect into the Shopify admin after
    /// install, if configured.
    #[must_use]
    pub fn app_handle(&self) -> Option<&str> {
        self.app_handle.as_deref()
    }
}

// Verify InstallConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<InstallConfig>();
};

/// Builder for [`InstallConfig`].
///
/// Required: `api_key`, `api_secret_key`, `scopes` (non-empty) and `host`.
///
/// # Defaults
///
/// - `allowed_shop_domains`: `["myshopify.com"]`
/// - `api_version`: latest stable
/// - `is_embedded`: `true`
/// - `token_exchange_timeout`: 10 seconds
/// - `pending_auth_ttl`: 10 minutes
#[derive(Debug, Default)]
pub struct InstallConfigBuilder {
    api_key: Option<ApiKey>,
    api_secret_key: Option<ApiSecretKey>,
    old_api_secret_key: Option<ApiSecretKey>,
    scopes: Option<AuthScopes>,
    host: Option<HostUrl>,
    allowed_shop_domains: Option<Vec<String>>,
    api_version: Option<ApiVersion>,
    is_embedded: Option<bool>,
    token_exchange_timeout: Option<Duration>,
    pending_auth_ttl: Option<Duration>,
    app_handle: Option<String>,
}

impl InstallConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key (required).
    #[must_use]
    pub fn api_key(mut self, key: ApiKey) -> Self {
        self.api_key = Some(key);
        self
    }

    /// Sets the API secret key (required).
    #[must_use]
    pub fn api_secret_key(mut self, key: ApiSecretKey) -> Self {
        self.api_secret_key = Some(key);
        self
    }

    /// Sets the previous API secret key for rotation.
    #[must_use]
    pub fn old_api_secret_key(mut self, key: ApiSecretKey) -> Self {
        self.old_api_secret_key = Some(key);
        self
    }

    /// Sets the requested OAuth scopes (required, non-empty).
    #[must_use]
    pub fn scopes(mut self, scopes: AuthScopes) -> Self {
        self.scopes = Some(scopes);
        self
    }

    /// Sets the externally reachable base URL (required).
    #[must_use]
    pub fn host(mut self, host: HostUrl) -> Self {
        self.host = Some(host);
        self
    }

    /// Replaces the provider domains shops must belong to.
    #[must_use]
    pub fn allowed_shop_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_shop_domains = Some(domains.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the Admin API version.
    #[must_use]
    pub fn api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = Some(version);
        self
    }

    /// Sets whether the app is embedded in the Shopify admin.
    #[must_use]
    pub const fn is_embedded(mut self, embedded: bool) -> Self {
        self.is_embedded = Some(embedded);
        self
    }

    /// Sets the token exchange timeout.
    #[must_use]
    pub const fn token_exchange_timeout(mut self, timeout: Duration) -> Self {
        self.token_exchange_timeout = Some(timeout);
        self
    }

    /// Sets how long an issued state stays valid.
    #[must_use]
    pub const fn pending_auth_ttl(mut self, ttl: Duration) -> Self {
        self.pending_auth_ttl = Some(ttl);
        self
    }

    /// Sets the app handle for the post-install admin redirect.
    #[must_use]
    pub fn app_handle(mut self, handle: impl Into<String>) -> Self {
        self.app_handle = Some(handle.into());
        self
    }

    /// Builds the [`InstallConfig`].
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingRequiredField`] if a required field is unset
    /// - [`ConfigError::EmptyScopes`] if the scope set is empty
    /// - [`ConfigError::InvalidShopDomain`] if an allowed domain is not a hostname
    /// - [`ConfigError::InvalidEnvVar`] if the app handle has characters outside `[A-Za-z0-9_-]`
    pub fn build(self) -> Result<InstallConfig, ConfigError> {
        let api_key = self
            .api_key
            .ok_or(ConfigError::MissingRequiredField { field: "api_key" })?;
        let api_secret_key = self
            .api_secret_key
            .ok_or(ConfigError::MissingRequiredField {
                field: "api_secret_key",
            })?;
        let scopes = self
            .scopes
            .ok_or(ConfigError::MissingRequiredField { field: "scopes" })?;
        if scopes.is_empty() {
            return Err(ConfigError::EmptyScopes);
        }
        let host = self
            .host
            .ok_or(ConfigError::MissingRequiredField { field: "host" })?;

        let allowed_shop_domains = match self.allowed_shop_domains {
            Some(domains) => normalize_domains(domains)?,
            None => vec![ShopDomain::DEFAULT_SUFFIX.to_string()],
        };

        let app_handle = self
            .app_handle
            .map(|handle| handle.trim().to_string())
            .filter(|handle| !handle.is_empty());
        if let Some(handle) = &app_handle {
            if !handle
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            {
                return Err(ConfigError::InvalidEnvVar {
                    name: "APP_HANDLE",
                    reason: format!("'{handle}' may only contain letters, digits, '-' and '_'"),
                });
            }
        }

        Ok(InstallConfig {
            api_key,
            api_secret_key,
            old_api_secret_key: self.old_api_secret_key,
            scopes,
            host,
            allowed_shop_domains,
            api_version: self.api_version.unwrap_or_default(),
            is_embedded: self.is_embedded.unwrap_or(true),
            token_exchange_timeout: self
                .token_exchange_timeout
                .unwrap_or(DEFAULT_TOKEN_EXCHANGE_TIMEOUT),
            pending_auth_ttl: self.pending_auth_ttl.unwrap_or(DEFAULT_PENDING_AUTH_TTL),
            app_handle,
        })
    }
}

fn normalize_domains(domains: Vec<String>) -> Result<Vec<String>, ConfigError> {
    let mut normalized = Vec::with_capacity(domains.len());
    for domain in domains {
        let trimmed = domain.trim().trim_start_matches('.').to_ascii_lowercase();
        if !trimmed.contains('.') {
            return Err(ConfigError::InvalidShopDomain { domain });
        }
        let parsed = ShopDomain::new(trimmed)?;
        normalized.push(parsed.as_ref().to_string());
    }
    if normalized.is_empty() {
        return Err(ConfigError::MissingRequiredField {
            field: "allowed_shop_domains",
        });
    }
    Ok(normalized)
}
