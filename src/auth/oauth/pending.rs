//! Registry of in-flight authorization attempts.

use std::time::{Duration, Instant};

use moka::future::Cache;
use moka::policy::EvictionPolicy;

use crate::auth::oauth::StateParam;
use crate::config::ShopDomain;

/// Upper bound on concurrently pending attempts.
const MAX_PENDING: u64 = 10_000;

/// In-flight attempts keyed by their state, each bound to the shop it was
/// issued for.
///
/// Entries expire after the configured lifetime. [`take`](Self::take)
/// removes the entry it returns, so a state is accepted at most once even
/// when two callbacks race.
///
/// Once full, the oldest attempt is evicted. A newly issued state is always
/// admitted, so a flood of abandoned `/auth` requests cannot lock out new
/// installs.
#[derive(Clone)]
pub struct PendingAuthorizations {
    attempts: Cache<String, (ShopDomain, Instant)>,
    ttl: Duration,
}

impl PendingAuthorizations {
    /// Creates an empty registry whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let attempts = Cache::builder()
            .max_capacity(MAX_PENDING)
            .eviction_policy(EvictionPolicy::lru())
            .time_to_live(ttl)
            .build();
        Self { attempts, ttl }
    }

    /// Generates a fresh state and records it for `shop`.
    pub async fn issue(&self, shop: &ShopDomain) -> StateParam {
        let state = StateParam::new();
        self.attempts
            .insert(state.as_ref().to_string(), (shop.clone(), Instant::now()))
            .await;
        state
    }

    /// Consumes `state`, returning the shop it was issued for.
    ///
    /// Returns `None` for unknown, expired or already consumed states.
    pub async fn take(&self, state: &str) -> Option<ShopDomain> {
        let (shop, issued_at) = self.attempts.remove(state).await?;
        // eviction is lazy, so the lifetime is checked here as well
        (issued_at.elapsed() < self.ttl).then_some(shop)
    }
}

impl std::fmt::Debug for PendingAuthorizations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingAuthorizations")
            .field("pending", &self.attempts.entry_count())
            .finish()
    }
}
