//! Authentication types for the install handshake.
//!
//! # Overview
//!
//! - [`AuthScopes`]: the scope set requested at install
//! - [`StoredCredential`] and [`AccessToken`]: what a completed install yields
//! - [`oauth`]: the authorization code handshake
//!
//! # OAuth Flow
//!
//! ```rust,ignore
//! use shopify_install::auth::oauth::HandshakeManager;
//!
//! // 1. Issue state and build the authorization URL
//! let started = manager.begin("my-store.myshopify.com").await?;
//! // Set started.state as a cookie, redirect to started.auth_url
//!
//! // 2. On callback, validate and exchange the code
//! let credential = manager.complete(&params, cookie_state.as_deref()).await?;
//! ```

mod credential;
pub mod oauth;
mod scopes;

pub use credential::{AccessToken, StoredCredential};
pub use scopes::AuthScopes;
