//! The anti-forgery state cookie.
//!
//! The cookie is scoped to `/auth` so it travels with the callback and
//! nowhere else. It is always `HttpOnly` and `Secure`.
//!
//! Embedded installs load inside the admin iframe and need `SameSite=None`.
//! Standalone installs use `Lax`: the callback arrives as a top-level
//! redirect from Shopify's domain, which a `Strict` cookie would not
//! accompany.

use std::time::Duration;

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

/// Name of the state cookie.
pub const STATE_COOKIE: &str = "shopify_oauth_state";

const COOKIE_PATH: &str = "/auth";

/// Returns the state presented in the request's cookies.
pub fn presented_state(jar: &CookieJar) -> Option<String> {
    jar.get(STATE_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

/// Builds the cookie carrying `state` for `ttl`.
pub fn state_cookie(state: &str, embedded: bool, ttl: Duration) -> Cookie<'static> {
    let max_age = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
    let mut cookie = base(state.to_string(), embedded);
    cookie.set_max_age(time::Duration::seconds(max_age));
    cookie
}

/// Builds the cookie that removes the state cookie.
pub fn clear_state_cookie(embedded: bool) -> Cookie<'static> {
    let mut cookie = base(String::new(), embedded);
    cookie.set_max_age(time::Duration::ZERO);
    cookie
}

fn base(value: String, embedded: bool) -> Cookie<'static> {
    Cookie::build((STATE_COOKIE, value))
        .path(COOKIE_PATH)
        .http_only(true)
        .secure(true)
        .same_site(same_site(embedded))
        .build()
}

const fn same_site(embedded: bool) -> SameSite {
    if embedded {
        SameSite::None
    } else {
        SameSite::Lax
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;
    use axum::http::{HeaderMap, HeaderValue};

    fn jar(header: &'static str) -> CookieJar {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static(header));
        CookieJar::from_headers(&headers)
    }

    #[test]
    fn test_presented_state_found_among_other_cookies() {
        let jar = jar("theme=dark; shopify_oauth_state=abc123; other=1");
        assert_eq!(presented_state(&jar).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_presented_state_missing() {
        assert_eq!(presented_state(&jar("shopify_oauth_state_old=1")), None);
        assert_eq!(presented_state(&jar("shopify_oauth_state=")), None);
        assert_eq!(presented_state(&CookieJar::new()), None);
    }

    #[test]
    fn test_state_cookie_attributes() {
        let cookie = state_cookie("abc", true, Duration::from_secs(600));
        assert_eq!(cookie.name(), STATE_COOKIE);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.path(), Some("/auth"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::None));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(600)));

        let standalone = state_cookie("abc", false, Duration::from_secs(600));
        assert_eq!(standalone.same_site(), Some(SameSite::Lax));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let cookie = clear_state_cookie(false);
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.path(), Some("/auth"));
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
        assert!(cookie.to_string().contains("Max-Age=0"));
    }
}
