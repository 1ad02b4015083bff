//! Admin API error types.
//!
//! Error messages carry the status code and Shopify's request id, never the
//! response body, so they can be logged and surfaced without echoing
//! upstream detail.

use thiserror::Error;

/// Errors returned by [`AdminClient`](super::AdminClient) calls.
///
/// # Example
///
/// ```rust
/// use shopify_install::clients::AdminError;
///
/// let error = AdminError::Response {
///     status: 422,
///     request_id: Some("abc-123".to_string()),
/// };
/// assert!(error.to_string().contains("422"));
/// assert!(error.to_string().contains("abc-123"));
/// ```
#[derive(Debug, Error)]
pub enum AdminError {
    /// Shopify answered with a non-2xx status.
    #[error("Admin API returned status {status} (request id: {})", request_id.as_deref().unwrap_or("none"))]
    Response {
        /// The HTTP status code.
        status: u16,
        /// The `X-Request-Id` header, if present.
        request_id: Option<String>,
    },

    /// A 2xx response did not have the expected shape.
    #[error("Unexpected Admin API response: {reason}")]
    UnexpectedResponse {
        /// What was missing or malformed.
        reason: String,
    },

    /// Network, timeout or body decoding error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The stored access token cannot be sent as a header value.
    #[error("Access token is not a valid header value")]
    InvalidToken,
}

// Verify AdminError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AdminError>();
};
