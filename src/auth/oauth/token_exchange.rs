//! Authorization code exchange.
//!
//! After a callback validates, the one-time `code` is exchanged for an
//! offline access token with a single POST to
//! `https://{shop}/admin/oauth/access_token`:
//!
//! ```text
//! POST /admin/oauth/access_token
//! {"client_id": "...", "client_secret": "...", "code": "..."}
//!
//! 200 {"access_token": "shpat_...", "scope": "write_products,write_themes"}
//! ```
//!
//! The call carries the configured timeout and is never retried: Shopify
//! consumes the code on first use, so a failed exchange has to start over
//! from the authorization redirect.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::auth::oauth::OAuthError;
use crate::auth::{AccessToken, AuthScopes};
use crate::config::{InstallConfig, ShopDomain};

/// Path of the token endpoint on a shop's domain.
pub const ACCESS_TOKEN_PATH: &str = "/admin/oauth/access_token";

#[derive(Serialize)]
struct AccessTokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
}

#[derive(Deserialize)]
struct AccessTokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

/// What a successful exchange returns.
#[derive(Clone, Debug)]
pub struct TokenGrant {
    /// The offline access token.
    pub access_token: AccessToken,
    /// The scopes Shopify reports as granted.
    pub scopes: AuthScopes,
}

/// HTTP client for the token endpoint.
#[derive(Clone, Debug)]
pub struct TokenExchangeClient {
    http: reqwest::Client,
    origin: Option<String>,
}

// Verify TokenExchangeClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<TokenExchangeClient>();
};

impl TokenExchangeClient {
    /// Creates a client whose requests fail after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns the underlying error if the TLS backend cannot be initialized.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .user_agent(crate::USER_AGENT)
            .build()?;
        Ok(Self { http, origin: None })
    }

    /// Sends every exchange to `origin` (for example `http://127.0.0.1:8080`)
    /// instead of `https://{shop}`.
    ///
    /// Intended for pointing the handshake at a local stub server.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into().trim_end_matches('/').to_string());
        self
    }

    fn endpoint(&self, shop: &ShopDomain) -> String {
        match &self.origin {
            Some(origin) => format!("{origin}{ACCESS_TOKEN_PATH}"),
            None => format!("https://{}{ACCESS_TOKEN_PATH}", shop.as_ref()),
        }
    }

    /// Exchanges `code` for an access token.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::TokenExchangeFailed`] on a network error, a
    /// timeout, a non-2xx status, or a body without a non-empty
    /// `access_token`. The response body is never included in the error.
    pub async fn exchange(
        &self,
        config: &InstallConfig,
        shop: &ShopDomain,
        code: &str,
    ) -> Result<TokenGrant, OAuthError> {
        let body = AccessTokenRequest {
            client_id: config.api_key().as_ref(),
            client_secret: config.api_secret_key().as_ref(),
            code,
        };

        let response = self
            .http
            .post(self.endpoint(shop))
            .json(&body)
            .send()
            .await
            .map_err(|e| failed(shop, &e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(shop = %shop, status = status.as_u16(), "token endpoint rejected exchange");
            return Err(OAuthError::TokenExchangeFailed {
                reason: format!("status {}", status.as_u16()),
            });
        }

        let parsed: AccessTokenResponse = response.json().await.map_err(|e| failed(shop, &e))?;

        let access_token = parsed
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                tracing::warn!(shop = %shop, "token response has no access_token");
                OAuthError::TokenExchangeFailed {
                    reason: "response missing access_token".to_string(),
                }
            })?;

        let scopes = parsed
            .scope
            .as_deref()
            .unwrap_or_default()
            .parse::<AuthScopes>()
            .unwrap_or_else(|e| {
                tracing::warn!(shop = %shop, error = %e, "ignoring unparseable granted scopes");
                AuthScopes::new()
            });

        Ok(TokenGrant {
            access_token: AccessToken::new(access_token),
            scopes,
        })
    }
}

fn failed(shop: &ShopDomain, error: &reqwest::Error) -> OAuthError {
    let reason = if error.is_timeout() {
        "timed out"
    } else if error.is_decode() {
        "malformed response body"
    } else {
        "request failed"
    };
    tracing::warn!(shop = %shop, reason, "token exchange failed");
    OAuthError::TokenExchangeFailed {
        reason: reason.to_string(),
    }
}
