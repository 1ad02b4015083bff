//! Install handshake routes.

use std::collections::HashMap;

use axum::extract::{Query, RawQuery, State};
use axum::http::header::LOCATION;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use axum_extra::extract::cookie::CookieJar;
use tracing::instrument;

use crate::auth::oauth::CallbackParams;
use crate::config::CALLBACK_PATH;
use crate::server::cookies;
use crate::server::{ApiError, AppState};

/// Build the install router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth", get(begin))
        .route(CALLBACK_PATH, get(callback))
}

/// Redirect the merchant to Shopify's authorization page.
#[instrument(skip_all, fields(shop = tracing::field::Empty))]
async fn begin(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let shop = query.get("shop").map(String::as_str).unwrap_or_default();
    tracing::Span::current().record("shop", shop);

    let started = state.manager().begin(shop).await?;
    let config = state.manager().config();
    let cookie = cookies::state_cookie(
        started.state.as_ref(),
        config.is_embedded(),
        config.pending_auth_ttl(),
    );

    Ok((StatusCode::FOUND, jar.add(cookie), [(LOCATION, started.auth_url)]).into_response())
}

/// Finish the install. The state cookie is cleared whatever the outcome,
/// including a query string that does not decode.
#[instrument(skip_all)]
async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    RawQuery(query): RawQuery,
) -> Response {
    let presented = cookies::presented_state(&jar);
    let config = state.manager().config();
    let jar = jar.add(cookies::clear_state_cookie(config.is_embedded()));

    let result = match CallbackParams::from_query(query.as_deref().unwrap_or_default()) {
        Ok(params) => state.manager().complete(&params, presented.as_deref()).await,
        Err(e) => Err(e),
    };
    let credential = match result {
        Ok(credential) => credential,
        Err(e) => return (jar, ApiError::from(e)).into_response(),
    };

    match config.app_handle() {
        Some(handle) => {
            let location = format!("https://{}/admin/apps/{handle}", credential.shop);
            (StatusCode::FOUND, jar, [(LOCATION, location)]).into_response()
        }
        None => (
            jar,
            Html(format!(
                "<!doctype html><title>Installed</title><p>App installed on {}.</p>",
                credential.shop
            )),
        )
            .into_response(),
    }
}
