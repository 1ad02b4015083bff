//! Admin API access for installed shops.
//!
//! Once a shop has completed the install handshake, its
//! [`StoredCredential`](crate::StoredCredential) can build an
//! [`AdminClient`] scoped to that shop and the configured API version.
//!
//! # Overview
//!
//! - [`AdminClient`]: authenticated REST client for one shop
//! - [`AdminError`]: status, shape and network failures
//! - [`push_theme`] / [`push_products`]: the two write operations the HTTP
//!   surface exposes
//!
//! Requests are sent once. A non-2xx response is reported with the status
//! and Shopify's `X-Request-Id`; the body is dropped.

mod admin_client;
mod errors;
mod push;

pub use admin_client::{AdminClient, ProductDraft, Theme, ThemeRole};
pub use errors::AdminError;
pub use push::{push_products, push_theme, CSS_ASSET_KEY, INDEX_ASSET_KEY, THEME_NAME};
