//! Application state shared across handlers.

use std::sync::Arc;

use crate::auth::oauth::HandshakeManager;
use crate::clients::{AdminClient, AdminError};
use crate::config::ApiSecretKey;

/// Application state shared across all handlers.
///
/// Cloning is cheap; everything lives behind one `Arc`, including the HTTP
/// client every push request sends through.
#[derive(Clone, Debug)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

#[derive(Debug)]
struct AppStateInner {
    manager: HandshakeManager,
    push_api_key: Option<ApiSecretKey>,
    admin_base_uri: Option<String>,
    admin_http: reqwest::Client,
}

impl AppState {
    /// Creates state for a server with the push routes disabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the Admin API HTTP client cannot be built.
    pub fn new(manager: HandshakeManager) -> Result<Self, AdminError> {
        Self::with_options(manager, None, None)
    }

    /// Creates state with an optional push API key and an optional Admin
    /// API origin override (for pointing pushes at a local stub).
    ///
    /// # Errors
    ///
    /// Returns an error if the Admin API HTTP client cannot be built.
    pub fn with_options(
        manager: HandshakeManager,
        push_api_key: Option<ApiSecretKey>,
        admin_base_uri: Option<String>,
    ) -> Result<Self, AdminError> {
        Ok(Self {
            inner: Arc::new(AppStateInner {
                manager,
                push_api_key,
                admin_base_uri,
                admin_http: AdminClient::http_client()?,
            }),
        })
    }

    /// The handshake manager.
    #[must_use]
    pub fn manager(&self) -> &HandshakeManager {
        &self.inner.manager
    }

    /// The key push callers must present, if push routes are enabled.
    #[must_use]
    pub fn push_api_key(&self) -> Option<&ApiSecretKey> {
        self.inner.push_api_key.as_ref()
    }

    pub(crate) fn admin_base_uri(&self) -> Option<&str> {
        self.inner.admin_base_uri.as_deref()
    }

    pub(crate) fn admin_http(&self) -> &reqwest::Client {
        &self.inner.admin_http
    }
}
