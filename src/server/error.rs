//! HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::auth::oauth::OAuthError;
use crate::clients::AdminError;

/// Error type returned by handlers.
///
/// Responses carry only a machine-readable kind, as `{"error": "<kind>"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A handshake or lookup failure.
    #[error(transparent)]
    OAuth(#[from] OAuthError),

    /// Missing or wrong bearer key on a push route.
    #[error("Unauthorized")]
    Unauthorized,

    /// The Admin API call failed.
    #[error("Upstream error: {0}")]
    Upstream(#[from] AdminError),
}

impl ApiError {
    /// The machine-readable kind sent to the client.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::OAuth(e) => e.kind(),
            Self::Unauthorized => "unauthorized",
            Self::Upstream(_) => "upstream_failed",
        }
    }

    /// The HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::OAuth(OAuthError::NotFound) => StatusCode::NOT_FOUND,
            Self::OAuth(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            Self::OAuth(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Upstream(e) = &self {
            tracing::error!(error = %e, "Admin API call failed");
        }
        (self.status(), Json(json!({ "error": self.kind() }))).into_response()
    }
}
