//! OAuth authorization code handshake for installing the app on a shop.
//!
//! # Flow
//!
//! 1. **Begin** ([`HandshakeManager::begin`]): validate the shop, issue a
//!    single-use [`StateParam`] bound to it, and build the authorization URL
//!    with [`begin_auth`].
//! 2. **Complete** ([`HandshakeManager::complete`]): consume the state,
//!    check it against the value the client presented, verify the callback
//!    `hmac`, re-validate the shop, then exchange the code with
//!    [`TokenExchangeClient`] and store the credential.
//! 3. **Lookup** ([`HandshakeManager::get_credential`]): read back the
//!    stored credential for downstream Admin API calls.
//!
//! # Security Features
//!
//! - **HMAC Validation**: callbacks are verified with HMAC-SHA256 over all
//!   parameters except `hmac`
//! - **CSRF Protection**: the state must match the client's cookie and an
//!   unexpired, unused attempt issued for the same shop
//! - **Constant-Time Comparison**: signatures and states never short-circuit
//!   on the first differing byte
//! - **Key Rotation Support**: an old API secret still verifies callbacks
//! - **SSRF Guard**: the shop is validated as a hostname within the allowed
//!   domains before it is used to build the token endpoint URL
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use shopify_install::auth::oauth::{HandshakeManager, OAuthError};
//! use shopify_install::store::MemoryCredentialStore;
//! use shopify_install::{ApiKey, ApiSecretKey, HostUrl, InstallConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let config = InstallConfig::builder()
//!     .api_key(ApiKey::new("api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("secret").unwrap())
//!     .scopes("write_products,write_themes".parse().unwrap())
//!     .host(HostUrl::new("https://app.example.com").unwrap())
//!     .build()
//!     .unwrap();
//!
//! let manager = HandshakeManager::new(config, Arc::new(MemoryCredentialStore::new())).unwrap();
//!
//! let started = manager.begin("my-store.myshopify.com").await.unwrap();
//! assert!(started.auth_url.contains(started.state.as_ref()));
//!
//! assert!(matches!(
//!     manager.begin("my-store.evil.example").await,
//!     Err(OAuthError::InvalidTenant { .. })
//! ));
//! # }
//! ```

mod begin_auth;
mod callback_params;
mod error;
mod handshake;
pub mod hmac;
mod pending;
mod state;
mod token_exchange;

pub use begin_auth::{begin_auth, BeginAuthResult};
pub use callback_params::CallbackParams;
pub use error::OAuthError;
pub use handshake::HandshakeManager;
pub use hmac::{compute_signature, constant_time_compare, verify_callback, verify_signature};
pub use pending::PendingAuthorizations;
pub use state::StateParam;
pub use token_exchange::{TokenExchangeClient, TokenGrant, ACCESS_TOKEN_PATH};
