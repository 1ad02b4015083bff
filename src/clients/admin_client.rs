//! Admin REST API client for a single installed shop.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::StoredCredential;
use crate::clients::AdminError;
use crate::config::{ApiVersion, ShopDomain};

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";
const REQUEST_ID_HEADER: &str = "X-Request-Id";
const DEPRECATED_REASON_HEADER: &str = "X-Shopify-API-Deprecated-Reason";

/// Role of a theme within a shop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeRole {
    /// The published theme.
    Main,
    /// Installed but not published.
    Unpublished,
    /// A development theme.
    Development,
}

/// A theme as returned by the Admin API.
#[derive(Clone, Debug, Deserialize)]
pub struct Theme {
    /// Theme id.
    pub id: u64,
    /// Theme name.
    pub name: String,
    /// Theme role, as reported by Shopify.
    #[serde(default)]
    pub role: Option<String>,
}

/// A new product with a single variant.
///
/// Deserializes from `{"title", "desc", "price"}`; `price` may be a string
/// or a number.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ProductDraft {
    /// Product title.
    pub title: String,
    /// Description HTML.
    #[serde(default, alias = "desc")]
    pub body_html: String,
    /// Price of the single variant, as a decimal string.
    #[serde(deserialize_with = "price_from_string_or_number")]
    pub price: String,
}

fn price_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected price as string or number, got {other}"
        ))),
    }
}

/// Client for `https://{shop}/admin/api/{version}/`.
///
/// Every call is a single request: no retries, and a non-2xx status becomes
/// [`AdminError::Response`].
///
/// # Example
///
/// ```rust
/// use shopify_install::clients::AdminClient;
/// use shopify_install::{AccessToken, ApiVersion, ShopDomain, StoredCredential};
///
/// let credential = StoredCredential::new(
///     ShopDomain::new("my-store").unwrap(),
///     AccessToken::new("shpat_123"),
///     "write_themes".parse().unwrap(),
/// );
///
/// let client = AdminClient::new(&credential, &ApiVersion::V2024_10).unwrap();
/// assert_eq!(client.base_url(), "https://my-store.myshopify.com/admin/api/2024-10");
/// ```
#[derive(Clone, Debug)]
pub struct AdminClient {
    client: reqwest::Client,
    token: HeaderValue,
    shop: ShopDomain,
    base_uri: String,
    base_path: String,
}

// Verify AdminClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AdminClient>();
};

impl AdminClient {
    /// Builds the HTTP client shared by every [`AdminClient`].
    ///
    /// It carries no credential, so one instance can serve all shops.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Network`] if the client cannot be built.
    pub fn http_client() -> Result<reqwest::Client, AdminError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        Ok(reqwest::Client::builder()
            .use_rustls_tls()
            .user_agent(crate::USER_AGENT)
            .default_headers(headers)
            .build()?)
    }

    /// Creates a client authenticated with `credential`, with its own HTTP
    /// client.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::InvalidToken`] if the token contains characters
    /// not allowed in a header, or [`AdminError::Network`] if the HTTP
    /// client cannot be built.
    pub fn new(credential: &StoredCredential, version: &ApiVersion) -> Result<Self, AdminError> {
        Self::with_http_client(Self::http_client()?, credential, version)
    }

    /// Creates a client authenticated with `credential` that sends through
    /// `client`, typically one built by [`AdminClient::http_client`].
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::InvalidToken`] if the token contains characters
    /// not allowed in a header.
    pub fn with_http_client(
        client: reqwest::Client,
        credential: &StoredCredential,
        version: &ApiVersion,
    ) -> Result<Self, AdminError> {
        let mut token = HeaderValue::from_str(credential.access_token.expose())
            .map_err(|_| AdminError::InvalidToken)?;
        token.set_sensitive(true);

        Ok(Self {
            client,
            token,
            shop: credential.shop.clone(),
            base_uri: format!("https://{}", credential.shop.as_ref()),
            base_path: format!("/admin/api/{version}"),
        })
    }

    /// Sends requests to `base_uri` instead of `https://{shop}`.
    #[must_use]
    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = base_uri.into().trim_end_matches('/').to_string();
        self
    }

    /// Returns the shop this client is bound to.
    #[must_use]
    pub const fn shop(&self) -> &ShopDomain {
        &self.shop
    }

    /// Returns the versioned API root, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("{}{}", self.base_uri, self.base_path)
    }

    /// Creates a theme.
    ///
    /// # Errors
    ///
    /// Returns an [`AdminError`] if the request fails or the response has no
    /// `theme` object.
    pub async fn create_theme(&self, name: &str, role: ThemeRole) -> Result<Theme, AdminError> {
        let body = json!({ "theme": { "name": name, "role": role } });
        let response = self.send(Method::POST, "themes.json", &body).await?;
        extract(response, "theme")
    }

    /// Creates or replaces the asset `key` in theme `theme_id`.
    ///
    /// # Errors
    ///
    /// Returns an [`AdminError`] if the request fails.
    pub async fn put_asset(&self, theme_id: u64, key: &str, value: &str) -> Result<(), AdminError> {
        let body = json!({ "asset": { "key": key, "value": value } });
        self.send(Method::PUT, &format!("themes/{theme_id}/assets.json"), &body)
            .await?;
        Ok(())
    }

    /// Creates a product with a single variant, returning the product
    /// resource as Shopify returned it.
    ///
    /// # Errors
    ///
    /// Returns an [`AdminError`] if the request fails or the response has no
    /// `product` object.
    pub async fn create_product(&self, draft: &ProductDraft) -> Result<Value, AdminError> {
        let body = json!({
            "product": {
                "title": draft.title,
                "body_html": draft.body_html,
                "variants": [{ "price": draft.price }],
            }
        });
        let response = self.send(Method::POST, "products.json", &body).await?;
        extract(response, "product")
    }

    async fn send(&self, method: Method, path: &str, body: &Value) -> Result<Value, AdminError> {
        let url = format!("{}/{path}", self.base_url());
        let response = self
            .client
            .request(method.clone(), &url)
            .header(ACCESS_TOKEN_HEADER, self.token.clone())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let request_id = header_string(response.headers(), REQUEST_ID_HEADER);

        if let Some(reason) = header_string(response.headers(), DEPRECATED_REASON_HEADER) {
            tracing::warn!(path, %reason, "deprecated Admin API request");
        }

        if !status.is_success() {
            tracing::warn!(
                shop = %self.shop,
                %method,
                path,
                status = status.as_u16(),
                request_id = request_id.as_deref().unwrap_or_default(),
                "Admin API request failed"
            );
            return Err(AdminError::Response {
                status: status.as_u16(),
                request_id,
            });
        }

        tracing::debug!(shop = %self.shop, %method, path, status = status.as_u16(), "Admin API request");
        Ok(response.json().await?)
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

fn extract<T: DeserializeOwned>(mut response: Value, field: &str) -> Result<T, AdminError> {
    let value = response
        .get_mut(field)
        .map(Value::take)
        .ok_or_else(|| AdminError::UnexpectedResponse {
            reason: format!("missing '{field}'"),
        })?;
    serde_json::from_value(value).map_err(|e| AdminError::UnexpectedResponse {
        reason: format!("malformed '{field}': {e}"),
    })
}
