//! The install handshake state machine.
//!
//! Each attempt moves `Initiated -> Completed | Failed`:
//!
//! - [`HandshakeManager::begin`] validates the shop, issues a state bound to
//!   it and returns the authorization URL.
//! - [`HandshakeManager::complete`] consumes the state, validates the
//!   callback, exchanges the code and stores the credential.
//!
//! A state is consumed before any other check runs, so it can never be
//! replayed, whatever the outcome of the attempt that presented it.
//!
//! # Callback validation order
//!
//! 1. `shop`, `code` and `state` present, else [`OAuthError::InvalidRequest`]
//! 2. the presented state equals the query `state` and was issued by this
//!    process and not yet used, else [`OAuthError::StateMismatch`]
//! 3. the `hmac` verifies, else [`OAuthError::SignatureInvalid`]
//! 4. `shop` is a hostname within the allowed domains, else
//!    [`OAuthError::TenantInvalid`]
//! 5. `shop` is the shop the state was issued for, else
//!    [`OAuthError::StateMismatch`]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::Instrument;

use crate::auth::oauth::hmac::{constant_time_compare, verify_callback};
use crate::auth::oauth::{
    begin_auth, BeginAuthResult, CallbackParams, OAuthError, PendingAuthorizations,
    TokenExchangeClient,
};
use crate::auth::StoredCredential;
use crate::config::{InstallConfig, ShopDomain};
use crate::store::CredentialStore;

type ShopLock = Arc<tokio::sync::Mutex<()>>;

/// Owns the install flow and custody of the resulting credentials.
///
/// # Thread Safety
///
/// `HandshakeManager` is `Send + Sync`; share it behind an `Arc`.
/// Completions for different shops run in parallel. Completions for the
/// same shop serialize their store writes.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use shopify_install::auth::oauth::{CallbackParams, HandshakeManager};
/// use shopify_install::store::MemoryCredentialStore;
///
/// let manager = HandshakeManager::new(config, Arc::new(MemoryCredentialStore::new()))?;
///
/// let started = manager.begin("my-store.myshopify.com").await?;
/// // set-cookie: started.state, redirect: started.auth_url
///
/// let params = CallbackParams::from_pairs(query_pairs);
/// let credential = manager.complete(&params, Some(cookie_value)).await?;
/// ```
pub struct HandshakeManager {
    config: InstallConfig,
    store: Arc<dyn CredentialStore>,
    pending: PendingAuthorizations,
    exchange: TokenExchangeClient,
    shop_locks: Mutex<HashMap<ShopDomain, ShopLock>>,
}

// Verify HandshakeManager is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HandshakeManager>();
};

impl HandshakeManager {
    /// Creates a manager that exchanges codes directly with each shop.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(
        config: InstallConfig,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, reqwest::Error> {
        let exchange = TokenExchangeClient::new(config.token_exchange_timeout())?;
        Ok(Self::with_exchange_client(config, store, exchange))
    }

    /// Creates a manager using a preconfigured token exchange client.
    #[must_use]
    pub fn with_exchange_client(
        config: InstallConfig,
        store: Arc<dyn CredentialStore>,
        exchange: TokenExchangeClient,
    ) -> Self {
        let pending = PendingAuthorizations::new(config.pending_auth_ttl());
        Self {
            config,
            store,
            pending,
            exchange,
            shop_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &InstallConfig {
        &self.config
    }

    /// Starts an authorization attempt for `shop`.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::InvalidTenant`] if `shop` is empty, is not a
    /// hostname, or is outside the allowed shop domains.
    pub async fn begin(&self, shop: &str) -> Result<BeginAuthResult, OAuthError> {
        let shop = self
            .validate_shop(shop)
            .map_err(|reason| OAuthError::InvalidTenant { reason })?;

        let state = self.pending.issue(&shop).await;
        tracing::info!(shop = %shop, "authorization started");

        Ok(begin_auth(&self.config, &shop, state))
    }

    /// Completes an attempt from its callback parameters and the state the
    /// client presented alongside them (its cookie).
    ///
    /// Performs at most one outbound request. On success the credential is
    /// stored and returned.
    ///
    /// # Errors
    ///
    /// See the module documentation for the validation order. Exchange
    /// failures yield [`OAuthError::TokenExchangeFailed`]; store failures
    /// yield [`OAuthError::Storage`].
    pub async fn complete(
        &self,
        params: &CallbackParams,
        presented_state: Option<&str>,
    ) -> Result<StoredCredential, OAuthError> {
        let span = tracing::info_span!("oauth_complete", shop = params.shop().unwrap_or_default());
        let result = self
            .complete_attempt(params, presented_state)
            .instrument(span.clone())
            .await;

        let _entered = span.enter();
        match &result {
            Ok(_) => tracing::info!("authorization completed"),
            Err(e) if e.is_client_error() => tracing::warn!(kind = e.kind(), "callback rejected"),
            Err(e) => tracing::error!(kind = e.kind(), error = %e, "authorization failed"),
        }
        result
    }

    async fn complete_attempt(
        &self,
        params: &CallbackParams,
        presented_state: Option<&str>,
    ) -> Result<StoredCredential, OAuthError> {
        // Consume every state involved before validating anything.
        let issued_for = match params.state() {
            Some(state) => self.pending.take(state).await,
            None => None,
        };
        if let Some(presented) = presented_state {
            if params.state() != Some(presented) {
                self.pending.take(presented).await;
            }
        }

        let shop_param = params.shop().ok_or(OAuthError::InvalidRequest { param: "shop" })?;
        let code = params.code().ok_or(OAuthError::InvalidRequest { param: "code" })?;
        let state = params.state().ok_or(OAuthError::InvalidRequest { param: "state" })?;

        let presented = presented_state.ok_or(OAuthError::StateMismatch)?;
        if !constant_time_compare(state, presented) {
            return Err(OAuthError::StateMismatch);
        }
        let issued_for = issued_for.ok_or(OAuthError::StateMismatch)?;

        if !verify_callback(params, &self.config) {
            return Err(OAuthError::SignatureInvalid);
        }

        let shop = self
            .validate_shop(shop_param)
            .map_err(|reason| OAuthError::TenantInvalid { reason })?;

        if shop != issued_for {
            return Err(OAuthError::StateMismatch);
        }

        let grant = self.exchange.exchange(&self.config, &shop, code).await?;

        if !grant.scopes.is_empty() && !grant.scopes.covers(self.config.scopes()) {
            tracing::warn!(
                granted = %grant.scopes,
                requested = %self.config.scopes(),
                "granted scopes do not cover requested scopes"
            );
        }

        let credential = StoredCredential::new(shop, grant.access_token, grant.scopes);
        self.store_serialized(credential.clone()).await?;
        Ok(credential)
    }

    /// Returns the credential stored for `shop`.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::NotFound`] if there is none, or
    /// [`OAuthError::Storage`] if the store fails.
    pub async fn get_credential(&self, shop: &ShopDomain) -> Result<StoredCredential, OAuthError> {
        self.store.get(shop).await?.ok_or(OAuthError::NotFound)
    }

    fn validate_shop(&self, raw: &str) -> Result<ShopDomain, String> {
        let shop = ShopDomain::new(raw).map_err(|_| "not a valid shop hostname".to_string())?;
        if !shop.is_within(self.config.allowed_shop_domains()) {
            return Err("shop is not on an allowed domain".to_string());
        }
        Ok(shop)
    }

    async fn store_serialized(&self, credential: StoredCredential) -> Result<(), OAuthError> {
        let lock = {
            let mut locks = self.shop_locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(credential.shop.clone()).or_default())
        };

        let shop = credential.shop.clone();
        let result = {
            let _guard = lock.lock().await;
            self.store.put(credential).await
        };

        // Drop the per-shop lock once nobody else is waiting on it.
        let mut locks = self.shop_locks.lock().unwrap_or_else(PoisonError::into_inner);
        if Arc::strong_count(&lock) <= 2 {
            locks.remove(&shop);
        }

        result.map_err(OAuthError::from)
    }
}

impl std::fmt::Debug for HandshakeManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandshakeManager")
            .field("config", &self.config)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::oauth::hmac::compute_signature;
    use crate::config::{ApiKey, ApiSecretKey, HostUrl};
    use crate::store::MemoryCredentialStore;
    use std::time::Duration;

    fn create_test_config() -> InstallConfig {
        InstallConfig::builder()
            .api_key(ApiKey::new("test-api-key").unwrap())
            .api_secret_key(ApiSecretKey::new("test-secret").unwrap())
            .scopes("write_products,write_themes".parse().unwrap())
            .host(HostUrl::new("https://app.example.com").unwrap())
            .allowed_shop_domains(["example.com", "myshopify.com"])
            .build()
            .unwrap()
    }

    fn manager() -> HandshakeManager {
        // Unroutable origin: any exchange that is reached fails fast.
        let exchange = TokenExchangeClient::new(Duration::from_millis(200))
            .unwrap()
            .with_origin("http://127.0.0.1:9");
        HandshakeManager::with_exchange_client(
            create_test_config(),
            Arc::new(MemoryCredentialStore::new()),
            exchange,
        )
    }

    fn signed(pairs: &[(&str, &str)], secret: &str) -> CallbackParams {
        let mut params = CallbackParams::from_pairs(pairs.iter().copied());
        let hmac = compute_signature(&params.signable_string(), secret).unwrap();
        params.insert("hmac", hmac);
        params
    }

    #[tokio::test]
    async fn test_begin_rejects_bad_shops() {
        let manager = manager();
        for shop in ["", "   ", "https://a.example.com", "a.example.com/x", "evil.org", "1.2.3.4"] {
            let result = manager.begin(shop).await;
            assert!(
                matches!(result, Err(OAuthError::InvalidTenant { .. })),
                "accepted {shop:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_missing_parameters_are_invalid_request() {
        let manager = manager();
        let params = CallbackParams::from_pairs([("shop", "a.example.com"), ("state", "s")]);
        let result = manager.complete(&params, Some("s")).await;
        assert!(matches!(
            result,
            Err(OAuthError::InvalidRequest { param: "code" })
        ));
    }

    #[tokio::test]
    async fn test_missing_cookie_is_state_mismatch() {
        let manager = manager();
        let started = manager.begin("a.example.com").await.unwrap();
        let params = signed(
            &[
                ("shop", "a.example.com"),
                ("code", "abc"),
                ("state", started.state.as_ref()),
            ],
            "test-secret",
        );

        let result = manager.complete(&params, None).await;
        assert!(matches!(result, Err(OAuthError::StateMismatch)));
    }

    #[tokio::test]
    async fn test_state_is_consumed_even_when_validation_fails() {
        let manager = manager();
        let started = manager.begin("a.example.com").await.unwrap();
        let state = started.state.to_string();

        let bad = signed(
            &[("shop", "a.example.com"), ("code", "abc"), ("state", &state)],
            "wrong-secret",
        );
        let first = manager.complete(&bad, Some(&state)).await;
        assert!(matches!(first, Err(OAuthError::SignatureInvalid)));

        let good = signed(
            &[("shop", "a.example.com"), ("code", "abc"), ("state", &state)],
            "test-secret",
        );
        let second = manager.complete(&good, Some(&state)).await;
        assert!(matches!(second, Err(OAuthError::StateMismatch)));
    }

    #[tokio::test]
    async fn test_state_issued_for_other_shop_is_rejected() {
        let manager = manager();
        let started = manager.begin("a.example.com").await.unwrap();
        let state = started.state.to_string();

        let params = signed(
            &[("shop", "b.example.com"), ("code", "abc"), ("state", &state)],
            "test-secret",
        );
        let result = manager.complete(&params, Some(&state)).await;
        assert!(matches!(result, Err(OAuthError::StateMismatch)));
    }

    #[tokio::test]
    async fn test_signed_callback_with_disallowed_shop_is_tenant_invalid() {
        let manager = manager();
        let started = manager.begin("a.example.com").await.unwrap();
        let state = started.state.to_string();

        let params = signed(
            &[("shop", "a.example.com/evil"), ("code", "abc"), ("state", &state)],
            "test-secret",
        );
        let result = manager.complete(&params, Some(&state)).await;
        assert!(matches!(result, Err(OAuthError::TenantInvalid { .. })));
    }

    #[tokio::test]
    async fn test_get_credential_on_empty_store_is_not_found() {
        let manager = manager();
        let shop = ShopDomain::new("a.example.com").unwrap();
        assert!(matches!(
            manager.get_credential(&shop).await,
            Err(OAuthError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_token_endpoint_is_exchange_failure() {
        let manager = manager();
        let started = manager.begin("a.example.com").await.unwrap();
        let state = started.state.to_string();

        let params = signed(
            &[("shop", "a.example.com"), ("code", "abc"), ("state", &state)],
            "test-secret",
        );
        let result = manager.complete(&params, Some(&state)).await;
        assert!(matches!(result, Err(OAuthError::TokenExchangeFailed { .. })));

        let shop = ShopDomain::new("a.example.com").unwrap();
        assert!(matches!(
            manager.get_credential(&shop).await,
            Err(OAuthError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_same_shop_completions_serialize_and_release_lock() {
        use serde_json::json;
        use wiremock::matchers::{body_partial_json, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        for (code, token) in [("code-1", "tok_1"), ("code-2", "tok_2")] {
            Mock::given(method("POST"))
                .and(path(crate::auth::oauth::ACCESS_TOKEN_PATH))
                .and(body_partial_json(json!({ "code": code })))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_delay(Duration::from_millis(50))
                        .set_body_json(json!({
                            "access_token": token,
                            "scope": "write_products,write_themes"
                        })),
                )
                .expect(1)
                .mount(&server)
                .await;
        }

        let exchange = TokenExchangeClient::new(Duration::from_secs(2))
            .unwrap()
            .with_origin(server.uri());
        let manager = HandshakeManager::with_exchange_client(
            create_test_config(),
            Arc::new(MemoryCredentialStore::new()),
            exchange,
        );

        let first = manager.begin("a.example.com").await.unwrap().state.to_string();
        let second = manager.begin("a.example.com").await.unwrap().state.to_string();
        let first_params = signed(
            &[("shop", "a.example.com"), ("code", "code-1"), ("state", &first)],
            "test-secret",
        );
        let second_params = signed(
            &[("shop", "a.example.com"), ("code", "code-2"), ("state", &second)],
            "test-secret",
        );

        let (a, b) = tokio::join!(
            manager.complete(&first_params, Some(&first)),
            manager.complete(&second_params, Some(&second)),
        );
        assert_eq!(a.unwrap().access_token.expose(), "tok_1");
        assert_eq!(b.unwrap().access_token.expose(), "tok_2");

        let shop = ShopDomain::new("a.example.com").unwrap();
        let stored = manager.get_credential(&shop).await.unwrap();
        assert!(["tok_1", "tok_2"].contains(&stored.access_token.expose()));
        assert!(manager.shop_locks.lock().unwrap().is_empty());
    }
}
