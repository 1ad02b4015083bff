//! HTTP surface.
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `GET /` | liveness |
//! | `GET /auth?shop=` | start an install, redirect to Shopify |
//! | `GET /auth/callback` | finish an install |
//! | `POST /api/push-theme` | upload a theme to an installed shop |
//! | `POST /api/push-products` | create products in an installed shop |
//!
//! The push routes are mounted only when a push API key is configured.

mod api;
mod auth;
pub mod cookies;
mod error;
mod state;

use axum::http::{Request, Response};
use axum::routing::get;
use axum::Router;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

pub use api::{PushProductsRequest, PushProductsResponse, PushThemeRequest, PushThemeResponse};
pub use error::ApiError;
pub use state::AppState;

/// Body of `GET /`.
pub const LIVENESS_BODY: &str = "DropifyHub backend running";

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/", get(liveness))
        .merge(auth::router());

    if state.push_api_key().is_some() {
        app = app.merge(api::router());
    } else {
        tracing::info!("API_ACCESS_KEY not set; push routes disabled");
    }

    app.layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                // Path only: the callback query carries the one-time code.
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    status = tracing::field::Empty,
                    latency_ms = tracing::field::Empty,
                )
            })
            .on_response(
                |response: &Response<_>, latency: std::time::Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                    DefaultOnResponse::default().on_response(response, latency, span);
                },
            ),
    )
    .with_state(state)
}

async fn liveness() -> &'static str {
    LIVENESS_BODY
}
