//! Credential storage.
//!
//! The handshake writes credentials through the [`CredentialStore`] trait
//! rather than owning a map, so the storage lifetime is a deployment choice.
//! [`MemoryCredentialStore`] keeps them for the life of the process; a
//! durable backend implements the same two methods.
//!
//! # Example
//!
//! ```rust
//! use shopify_install::store::{CredentialStore, MemoryCredentialStore};
//! use shopify_install::{AccessToken, ShopDomain, StoredCredential};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = MemoryCredentialStore::new();
//! let shop = ShopDomain::new("my-store").unwrap();
//!
//! store
//!     .put(StoredCredential::new(
//!         shop.clone(),
//!         AccessToken::new("shpat_123"),
//!         "write_products".parse().unwrap(),
//!     ))
//!     .await
//!     .unwrap();
//!
//! let found = store.get(&shop).await.unwrap().unwrap();
//! assert_eq!(found.access_token.expose(), "shpat_123");
//! # }
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::auth::StoredCredential;
use crate::config::ShopDomain;

/// Errors reported by a credential store backend.
#[derive(Debug, Error)]
pub enum CredentialStoreError {
    /// The backend could not be reached or refused the operation.
    #[error("Credential store unavailable: {0}")]
    Unavailable(String),
}

/// Keyed storage for shop credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns the credential stored for `shop`, if any.
    async fn get(&self, shop: &ShopDomain) -> Result<Option<StoredCredential>, CredentialStoreError>;

    /// Stores `credential`, replacing any previous one for the same shop.
    async fn put(&self, credential: StoredCredential) -> Result<(), CredentialStoreError>;
}

/// Process-local credential store.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credentials: RwLock<HashMap<ShopDomain, StoredCredential>>,
}

impl MemoryCredentialStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored credentials.
    pub async fn len(&self) -> usize {
        self.credentials.read().await.len()
    }

    /// Returns `true` if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.credentials.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, shop: &ShopDomain) -> Result<Option<StoredCredential>, CredentialStoreError> {
        Ok(self.credentials.read().await.get(shop).cloned())
    }

    async fn put(&self, credential: StoredCredential) -> Result<(), CredentialStoreError> {
        self.credentials
            .write()
            .await
            .insert(credential.shop.clone(), credential);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AccessToken, AuthScopes};

    fn credential(shop: &str, token: &str) -> StoredCredential {
        StoredCredential::new(
            ShopDomain::new(shop).unwrap(),
            AccessToken::new(token),
            AuthScopes::new(),
        )
    }

    #[tokio::test]
    async fn test_get_missing_shop_returns_none() {
        let store = MemoryCredentialStore::new();
        let shop = ShopDomain::new("missing.example.com").unwrap();
        assert!(store.get(&shop).await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_put_replaces_previous_credential() {
        let store = MemoryCredentialStore::new();
        store.put(credential("a.example.com", "first")).await.unwrap();
        store.put(credential("a.example.com", "second")).await.unwrap();

        let shop = ShopDomain::new("a.example.com").unwrap();
        let found = store.get(&shop).await.unwrap().unwrap();
        assert_eq!(found.access_token.expose(), "second");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_shops_are_isolated() {
        let store = MemoryCredentialStore::new();
        store.put(credential("a.example.com", "tok_a")).await.unwrap();
        store.put(credential("b.example.com", "tok_b")).await.unwrap();

        let a = ShopDomain::new("a.example.com").unwrap();
        let b = ShopDomain::new("b.example.com").unwrap();
        assert_eq!(store.get(&a).await.unwrap().unwrap().access_token.expose(), "tok_a");
        assert_eq!(store.get(&b).await.unwrap().unwrap().access_token.expose(), "tok_b");
    }
}
