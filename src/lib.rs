//! # Shopify Install
//!
//! Backend for installing a Shopify app on a merchant's shop through the
//! OAuth authorization code grant, with strict anti-forgery state checking,
//! HMAC callback verification and credential custody.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`InstallConfig`] and [`InstallConfigBuilder`],
//!   or from the environment via [`EnvSettings`]
//! - Validated newtypes for API credentials and shop domains
//! - OAuth scope handling with implied read scopes
//! - The install handshake via [`auth::oauth::HandshakeManager`]
//! - A storage seam for credentials via [`store::CredentialStore`]
//! - An Admin REST client for installed shops via [`clients::AdminClient`]
//! - An axum HTTP surface via [`server::router`]
//!
//! ## Quick Start
//!
//! ```rust
//! use shopify_install::{InstallConfig, ApiKey, ApiSecretKey, ApiVersion, HostUrl};
//!
//! let config = InstallConfig::builder()
//!     .api_key(ApiKey::new("your-api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("your-api-secret").unwrap())
//!     .scopes("write_products,write_themes".parse().unwrap())
//!     .host(HostUrl::new("https://your-app.example.com").unwrap())
//!     .api_version(ApiVersion::latest())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.redirect_uri(), "https://your-app.example.com/auth/callback");
//! ```
//!
//! ## Serving
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use shopify_install::auth::oauth::HandshakeManager;
//! use shopify_install::server::{router, AppState};
//! use shopify_install::store::MemoryCredentialStore;
//! use shopify_install::EnvSettings;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = EnvSettings::from_env()?;
//! let manager = HandshakeManager::new(settings.install, Arc::new(MemoryCredentialStore::new()))?;
//! let app = router(AppState::with_options(manager, settings.push_api_key, None)?);
//!
//! let listener = tokio::net::TcpListener::bind(settings.bind_addr).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: configuration is instance-based and passed explicitly
//! - **Fail-fast validation**: all newtypes validate on construction
//! - **Fail closed**: any doubt in a callback rejects it
//! - **Thread-safe**: all shared types are `Send + Sync`
//! - **No token leaks**: access tokens and secrets have masked `Debug` output

pub mod auth;
pub mod clients;
pub mod config;
mod error;
pub mod server;
pub mod store;

// Re-export public types at crate root for convenience
pub use auth::{AccessToken, AuthScopes, StoredCredential};
pub use config::{
    ApiKey, ApiSecretKey, ApiVersion, EnvSettings, HostUrl, InstallConfig, InstallConfigBuilder,
    LogFormat, ShopDomain,
};
pub use error::ConfigError;

// Re-export handshake types for convenience
pub use auth::oauth::{BeginAuthResult, CallbackParams, HandshakeManager, OAuthError, StateParam};

/// `User-Agent` sent on every outbound request.
pub(crate) const USER_AGENT: &str = concat!("shopify-install/", env!("CARGO_PKG_VERSION"));
