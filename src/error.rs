//! Configuration error types.
//!
//! All configuration constructors return `Result<T, ConfigError>` so that a
//! misconfigured deployment fails at startup instead of issuing redirects with
//! missing credentials.
//!
//! # Example
//!
//! ```rust
//! use shopify_install::{ApiKey, ConfigError};
//!
//! let result = ApiKey::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyApiKey)));
//! ```

use thiserror::Error;

/// Errors that can occur while building or loading configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// API key cannot be empty.
    #[error("API key cannot be empty. Please provide a valid Shopify API key.")]
    EmptyApiKey,

    /// API secret key cannot be empty.
    #[error("API secret key cannot be empty. Please provide a valid Shopify API secret key.")]
    EmptyApiSecretKey,

    /// Shop domain is not a plausible hostname.
    #[error("Invalid shop domain '{domain}'. Expected a bare hostname such as 'shop-name.myshopify.com'.")]
    InvalidShopDomain {
        /// The invalid domain that was provided.
        domain: String,
    },

    /// API version is invalid.
    #[error("Invalid API version '{version}'. Expected format: 'YYYY-MM' (e.g., '2024-10') or 'unstable'.")]
    InvalidApiVersion {
        /// The invalid version string that was provided.
        version: String,
    },

    /// Scopes are invalid.
    #[error("Invalid scopes: {reason}")]
    InvalidScopes {
        /// The reason the scopes are invalid.
        reason: String,
    },

    /// No scopes were configured.
    #[error("At least one OAuth scope must be configured.")]
    EmptyScopes,

    /// A required field is missing.
    #[error("Missing required field: '{field}'. This field must be set before building the configuration.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },

    /// Host URL is invalid.
    #[error("Invalid host URL '{url}'. Please provide an absolute URL such as 'https://myapp.example.com'.")]
    InvalidHostUrl {
        /// The invalid URL that was provided.
        url: String,
    },

    /// Host URL does not use HTTPS.
    #[error("Host URL '{url}' must use https; the OAuth callback cannot be served over plain http.")]
    InsecureHostUrl {
        /// The rejected URL.
        url: String,
    },

    /// A required environment variable is not set.
    #[error("Missing environment variable: {name}")]
    MissingEnvVar {
        /// The variable name.
        name: &'static str,
    },

    /// An environment variable could not be parsed.
    #[error("Invalid environment variable {name}: {reason}")]
    InvalidEnvVar {
        /// The variable name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}
