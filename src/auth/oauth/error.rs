//! OAuth handshake error types.
//!
//! Every failed [`begin`](super::HandshakeManager::begin),
//! [`complete`](super::HandshakeManager::complete) or
//! [`get_credential`](super::HandshakeManager::get_credential) call yields
//! exactly one of these variants. [`OAuthError::kind`] gives the
//! machine-readable name reported to HTTP clients.
//!
//! Messages never contain secrets, tokens, state values or provider
//! response bodies.
//!
//! # Example
//!
//! ```rust
//! use shopify_install::auth::oauth::OAuthError;
//!
//! let error = OAuthError::SignatureInvalid;
//! assert_eq!(error.kind(), "signature_invalid");
//! assert_eq!(error.to_string(), "Callback signature validation failed");
//! ```

use crate::store::CredentialStoreError;
use thiserror::Error;

/// Errors that can occur during the install handshake.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// The shop passed to `begin` is missing or not an acceptable hostname.
    #[error("Invalid shop: {reason}")]
    InvalidTenant {
        /// Why the shop was rejected.
        reason: String,
    },

    /// A required callback parameter is absent or empty, or the query
    /// string does not decode.
    #[error("Invalid callback request: missing or malformed '{param}'")]
    InvalidRequest {
        /// The offending parameter, or `query` for an undecodable query.
        param: &'static str,
    },

    /// The callback state does not match an attempt issued to this client.
    ///
    /// Covers a missing state cookie, a cookie that differs from the query
    /// `state`, an expired or already used state, and a state issued for a
    /// different shop.
    #[error("State parameter mismatch")]
    StateMismatch,

    /// The callback `hmac` does not verify under the configured secret(s).
    #[error("Callback signature validation failed")]
    SignatureInvalid,

    /// The callback `shop` is not an acceptable hostname.
    #[error("Invalid shop in callback: {reason}")]
    TenantInvalid {
        /// Why the shop was rejected.
        reason: String,
    },

    /// The code-for-token exchange failed.
    ///
    /// The provider's response body is never included.
    #[error("Token exchange failed: {reason}")]
    TokenExchangeFailed {
        /// A short description such as `status 500` or `timed out`.
        reason: String,
    },

    /// No credential is stored for the shop.
    #[error("No credential stored for shop")]
    NotFound,

    /// The credential store failed.
    #[error(transparent)]
    Storage(#[from] CredentialStoreError),
}

impl OAuthError {
    /// Returns the machine-readable error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidTenant { .. } => "invalid_tenant",
            Self::InvalidRequest { .. } => "invalid_request",
            Self::StateMismatch => "state_mismatch",
            Self::SignatureInvalid => "signature_invalid",
            Self::TenantInvalid { .. } => "tenant_invalid",
            Self::TokenExchangeFailed { .. } => "token_exchange_failed",
            Self::NotFound => "not_found",
            Self::Storage(_) => "storage_error",
        }
    }

    /// Returns `true` for failures caused by the caller's input.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Self::TokenExchangeFailed { .. } | Self::Storage(_)
        )
    }
}

// Verify OAuthError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<OAuthError>();
};
