//! Authenticated push routes.
//!
//! These act on behalf of an installed shop using its stored credential.
//! Callers authenticate with `Authorization: Bearer <API_ACCESS_KEY>`.

use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use crate::auth::oauth::{constant_time_compare, OAuthError};
use crate::clients::{push_products, push_theme, AdminClient, ProductDraft};
use crate::config::ShopDomain;
use crate::server::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct PushThemeRequest {
    pub shop: String,
    pub html: String,
    pub css: String,
}

#[derive(Debug, Serialize)]
pub struct PushThemeResponse {
    pub theme_id: u64,
}

#[derive(Debug, Deserialize)]
pub struct PushProductsRequest {
    pub shop: String,
    pub products: Vec<ProductDraft>,
}

#[derive(Debug, Serialize)]
pub struct PushProductsResponse {
    pub products: Vec<Value>,
}

/// Build the push router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/push-theme", post(push_theme_handler))
        .route("/api/push-products", post(push_products_handler))
}

#[instrument(skip_all, fields(shop = tracing::field::Empty))]
async fn push_theme_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<PushThemeRequest>,
) -> Result<Json<PushThemeResponse>, ApiError> {
    let client = admin_client(&state, &headers, &body.shop).await?;
    let theme_id = push_theme(&client, &body.html, &body.css).await?;
    Ok(Json(PushThemeResponse { theme_id }))
}

#[instrument(skip_all, fields(shop = tracing::field::Empty, count = tracing::field::Empty))]
async fn push_products_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<PushProductsRequest>,
) -> Result<Json<PushProductsResponse>, ApiError> {
    tracing::Span::current().record("count", body.products.len());
    let client = admin_client(&state, &headers, &body.shop).await?;
    let products = push_products(&client, &body.products).await?;
    Ok(Json(PushProductsResponse { products }))
}

/// Checks the bearer key, then builds a client from the shop's credential.
async fn admin_client(
    state: &AppState,
    headers: &HeaderMap,
    shop: &str,
) -> Result<AdminClient, ApiError> {
    tracing::Span::current().record("shop", shop);
    authorize(state, headers)?;

    let shop = ShopDomain::new(shop).map_err(|_| OAuthError::InvalidTenant {
        reason: "not a valid shop hostname".to_string(),
    })?;
    let credential = state.manager().get_credential(&shop).await?;

    let client = AdminClient::with_http_client(
        state.admin_http().clone(),
        &credential,
        state.manager().config().api_version(),
    )?;
    Ok(match state.admin_base_uri() {
        Some(uri) => client.with_base_uri(uri),
        None => client,
    })
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = state.push_api_key() else {
        return Err(ApiError::Unauthorized);
    };

    let presented = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or_default();

    if presented.is_empty() || !constant_time_compare(presented, expected.as_ref()) {
        tracing::warn!("rejected push request with bad bearer key");
        return Err(ApiError::Unauthorized);
    }
    Ok(())
}
