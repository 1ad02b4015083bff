//! Anti-forgery state values.
//!
//! A [`StateParam`] is 128 bits from the operating system's CSPRNG,
//! hex-encoded. It is sent as the `state` query parameter of the
//! authorization URL and in a cookie, and must come back unchanged on the
//! callback.
//!
//! # Example
//!
//! ```rust
//! use shopify_install::auth::oauth::StateParam;
//!
//! let state = StateParam::new();
//! assert_eq!(state.as_ref().len(), 32);
//! assert!(state.as_ref().chars().all(|c| c.is_ascii_hexdigit()));
//! ```

use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;

/// A single-use anti-forgery value for one authorization attempt.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct StateParam(String);

// Verify StateParam is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<StateParam>();
};

impl StateParam {
    /// Number of random bytes in a generated state.
    pub const BYTES: usize = 16;

    /// Generates a new random state.
    #[must_use]
    pub fn new() -> Self {
        let mut bytes = [0u8; Self::BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Wraps a state value received from a client.
    ///
    /// No validation is applied; an unknown value simply fails to match.
    #[must_use]
    pub fn from_raw(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl Default for StateParam {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<str> for StateParam {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// States are bearer values until consumed; keep them out of logs.
impl fmt::Debug for StateParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StateParam(*****)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_state_is_32_lowercase_hex_chars() {
        let state = StateParam::new();
        assert_eq!(state.as_ref().len(), 32);
        assert!(state
            .as_ref()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_states_are_unique() {
        let states: HashSet<String> = (0..1000).map(|_| StateParam::new().to_string()).collect();
        assert_eq!(states.len(), 1000);
    }

    #[test]
    fn test_from_raw_preserves_value() {
        let state = StateParam::from_raw("client-value");
        assert_eq!(state.as_ref(), "client-value");
    }

    #[test]
    fn test_debug_does_not_print_value() {
        let state = StateParam::from_raw("abc123");
        assert!(!format!("{state:?}").contains("abc123"));
    }
}
