//! OAuth scope handling.
//!
//! [`AuthScopes`] holds the scopes exactly as configured, in a stable sorted
//! order, so the `scope` parameter of the authorization URL is identical for
//! every install attempt.

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A set of OAuth scopes for Shopify API access.
///
/// Parsing trims and deduplicates entries. Implied scopes are not added to
/// the set itself; [`AuthScopes::covers`] accounts for them instead, so that
/// `write_products` covers a requirement for `read_products`.
///
/// # Serialization
///
/// Serializes to and from a comma-separated string.
///
/// # Example
///
/// ```rust
/// use shopify_install::AuthScopes;
///
/// let scopes: AuthScopes = "write_themes, write_products".parse().unwrap();
/// assert_eq!(scopes.to_string(), "write_products,write_themes");
///
/// let required: AuthScopes = "read_products".parse().unwrap();
/// assert!(scopes.covers(&required));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AuthScopes {
    scopes: BTreeSet<String>,
}

impl AuthScopes {
    /// Creates an empty scope set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the scope set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Returns the number of scopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Returns `true` if every scope in `other` is held or implied by this set.
    #[must_use]
    pub fn covers(&self, other: &Self) -> bool {
        other.scopes.iter().all(|scope| self.grants(scope))
    }

    /// Returns the scopes in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(String::as_str)
    }

    fn grants(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
            || Self::implied_by(scope).is_some_and(|write| self.scopes.contains(&write))
    }

    /// `read_foo` is implied by `write_foo`, and likewise for the
    /// `unauthenticated_` family.
    fn implied_by(scope: &str) -> Option<String> {
        scope
            .strip_prefix("unauthenticated_read_")
            .map(|rest| format!("unauthenticated_write_{rest}"))
            .or_else(|| {
                scope
                    .strip_prefix("read_")
                    .map(|rest| format!("write_{rest}"))
            })
    }
}

impl FromStr for AuthScopes {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut scopes = BTreeSet::new();

        for scope in s.split(',') {
            let scope = scope.trim();
            if scope.is_empty() {
                continue;
            }

            if !scope.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(ConfigError::InvalidScopes {
                    reason: format!("Invalid characters in scope: '{scope}'"),
                });
            }

            scopes.insert(scope.to_string());
        }

        Ok(Self { scopes })
    }
}

impl fmt::Display for AuthScopes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for scope in &self.scopes {
            if !first {
                f.write_str(",")?;
            }
            f.write_str(scope)?;
            first = false;
        }
        Ok(())
    }
}

impl Serialize for AuthScopes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AuthScopes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_scopes_parses_comma_separated() {
        let scopes: AuthScopes = "write_themes, write_products,,".parse().unwrap();
        assert_eq!(scopes.len(), 2);
        assert_eq!(
            scopes.iter().collect::<Vec<_>>(),
            ["write_products", "write_themes"]
        );
    }

    #[test]
    fn test_auth_scopes_display_is_stable() {
        let a: AuthScopes = "write_themes,write_products".parse().unwrap();
        let b: AuthScopes = "write_products, write_themes, write_products".parse().unwrap();
        assert_eq!(a.to_string(), "write_products,write_themes");
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_auth_scopes_rejects_invalid_characters() {
        let result = "write_products&redirect_uri=evil".parse::<AuthScopes>();
        assert!(matches!(result, Err(ConfigError::InvalidScopes { .. })));
    }

    #[test]
    fn test_write_scope_covers_read_scope() {
        let granted: AuthScopes = "write_products".parse().unwrap();
        let required: AuthScopes = "read_products,write_products".parse().unwrap();
        assert!(granted.covers(&required));

        let granted: AuthScopes = "unauthenticated_write_checkouts".parse().unwrap();
        let required: AuthScopes = "unauthenticated_read_checkouts".parse().unwrap();
        assert!(granted.covers(&required));
    }

    #[test]
    fn test_read_scope_does_not_cover_write_scope() {
        let granted: AuthScopes = "read_products".parse().unwrap();
        let required: AuthScopes = "write_products".parse().unwrap();
        assert!(!granted.covers(&required));
    }

    #[test]
    fn test_auth_scopes_is_empty() {
        assert!(AuthScopes::new().is_empty());
        assert!("  ,  ".parse::<AuthScopes>().unwrap().is_empty());
    }

    #[test]
    fn test_auth_scopes_serializes_to_comma_separated_string() {
        let scopes: AuthScopes = "write_themes,write_products".parse().unwrap();
        let json = serde_json::to_string(&scopes).unwrap();
        assert_eq!(json, r#""write_products,write_themes""#);

        let back: AuthScopes = serde_json::from_str(&json).unwrap();
        assert_eq!(back, scopes);
    }
}
