//! Settings loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPIFY_API_KEY` - OAuth client identifier
//! - `SHOPIFY_API_SECRET` - OAuth client secret, also the callback HMAC key
//! - `SCOPES` - comma-separated scopes requested at install
//! - `HOST` - externally reachable `https://` base URL of this app
//!
//! ## Optional
//! - `SHOPIFY_OLD_API_SECRET` - previous secret, accepted during key rotation
//! - `SHOPIFY_ALLOWED_DOMAINS` - comma-separated shop domain suffixes (default: myshopify.com)
//! - `SHOPIFY_API_VERSION` - Admin API version (default: latest stable)
//! - `SHOPIFY_EMBEDDED` - `true`/`false` (default: true)
//! - `TOKEN_EXCHANGE_TIMEOUT_SECS` - token exchange timeout (default: 10)
//! - `APP_HANDLE` - app handle for the post-install admin redirect
//! - `API_ACCESS_KEY` - bearer key enabling the theme/product push API
//! - `BIND_ADDR` - bind address (default: 0.0.0.0)
//! - `PORT` - listen port (default: 3000)
//! - `LOG_FORMAT` - `text` or `json` (default: text)

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use super::{ApiKey, ApiSecretKey, ApiVersion, HostUrl, InstallConfig};
use crate::error::ConfigError;

const DEFAULT_PORT: u16 = 3000;

/// Output format for the tracing subscriber.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Process-level settings for the server binary.
#[derive(Clone, Debug)]
pub struct EnvSettings {
    /// Handshake configuration.
    pub install: InstallConfig,
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// Bearer key for the push API; the push routes are disabled when unset.
    pub push_api_key: Option<ApiSecretKey>,
    /// Log output format.
    pub log_format: LogFormat,
}

impl EnvSettings {
    /// Loads `.env` (if present) and then reads the process environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first missing or invalid variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Missing .env is normal outside development.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through `lookup`, which returns the value of a variable
    /// if it is set.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first missing or invalid variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let require = |name: &'static str| get(name).ok_or(ConfigError::MissingEnvVar { name });

        let mut builder = InstallConfig::builder()
            .api_key(ApiKey::new(require("SHOPIFY_API_KEY")?)?)
            .api_secret_key(ApiSecretKey::new(require("SHOPIFY_API_SECRET")?)?)
            .scopes(require("SCOPES")?.parse()?)
            .host(HostUrl::new(require("HOST")?)?);

        if let Some(old) = get("SHOPIFY_OLD_API_SECRET") {
            builder = builder.old_api_secret_key(ApiSecretKey::new(old)?);
        }
        if let Some(domains) = get("SHOPIFY_ALLOWED_DOMAINS") {
            builder = builder.allowed_shop_domains(
                domains
                    .split(',')
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(String::from)
                    .collect::<Vec<_>>(),
            );
        }
        if let Some(version) = get("SHOPIFY_API_VERSION") {
            builder = builder.api_version(version.parse::<ApiVersion>()?);
        }
        if let Some(embedded) = get("SHOPIFY_EMBEDDED") {
            builder = builder.is_embedded(parse_bool("SHOPIFY_EMBEDDED", &embedded)?);
        }
        if let Some(secs) = get("TOKEN_EXCHANGE_TIMEOUT_SECS") {
            let secs = parse_number::<u64>("TOKEN_EXCHANGE_TIMEOUT_SECS", &secs)?;
            if secs == 0 {
                return Err(ConfigError::InvalidEnvVar {
                    name: "TOKEN_EXCHANGE_TIMEOUT_SECS",
                    reason: "must be greater than zero".to_string(),
                });
            }
            builder = builder.token_exchange_timeout(Duration::from_secs(secs));
        }
        if let Some(handle) = get("APP_HANDLE") {
            builder = builder.app_handle(handle);
        }

        let install = builder.build()?;

        let ip = match get("BIND_ADDR") {
            Some(raw) => raw
                .trim()
                .parse::<IpAddr>()
                .map_err(|e| ConfigError::InvalidEnvVar {
                    name: "BIND_ADDR",
                    reason: e.to_string(),
                })?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };
        let port = match get("PORT") {
            Some(raw) => parse_number::<u16>("PORT", &raw)?,
            None => DEFAULT_PORT,
        };

        let push_api_key = get("API_ACCESS_KEY").map(ApiSecretKey::new).transpose()?;

        let log_format = match get("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::InvalidEnvVar {
                    name: "LOG_FORMAT",
                    reason: format!("expected 'text' or 'json', got '{other}'"),
                })
            }
        };

        Ok(Self {
            install,
            bind_addr: SocketAddr::new(ip, port),
            push_api_key,
            log_format,
        })
    }
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar {
            name,
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}

fn parse_number<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            name,
            reason: e.to_string(),
        })
}
