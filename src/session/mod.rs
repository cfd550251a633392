//! Session resolution and the session cookie
//!
//! Every host stores the same signed token in its own host-scoped cookie.
//! Resolution order is cache, then full verification; any failure simply
//! means "no identity".

mod cache;

pub use cache::{BoundedSessionCache, SessionCache};

use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use sso_core::{Identity, SecretKey, token};
use tracing::debug;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "sso_session";

/// Session cookie lifetime; the only expiry a session has
pub const SESSION_MAX_AGE_SECS: i64 = 3600;

/// Resolve a raw token to an identity.
///
/// Structurally invalid tokens fail before the cache is consulted. Tokens
/// that verify on a cache miss are added to the cache under the same key.
pub fn resolve(raw: &str, cache: &dyn SessionCache, key: &SecretKey) -> Option<Identity> {
    if !token::looks_like_token(raw) {
        return None;
    }

    if let Some(identity) = cache.get(raw) {
        return Some(identity);
    }

    match token::decode(raw, key) {
        Ok(identity) => {
            cache.put(raw, identity.clone());
            Some(identity)
        }
        Err(e) => {
            debug!(error = %e, "Session token rejected");
            None
        }
    }
}

/// Read, unescape and resolve the session cookie from request headers.
///
/// The jar already percent-decodes; the extra unescape also accepts values
/// written by clients that escape the token themselves.
pub fn identity_from_headers(
    headers: &HeaderMap,
    cache: &dyn SessionCache,
    key: &SecretKey,
) -> Option<Identity> {
    let jar = CookieJar::from_headers(headers);
    let value = jar.get(SESSION_COOKIE)?.value();
    if value.is_empty() {
        return None;
    }
    let raw = urlencoding::decode(value).ok()?;
    resolve(&raw, cache, key)
}

/// Cookie carrying `token` on the current host.
///
/// The jar percent-encodes the value when it is written, so the separator
/// and padding go out as `%2C` and `%3D`.
#[must_use]
pub fn session_cookie(token: &str, secure: bool) -> Cookie<'static> {
    build_cookie(token.to_string(), SESSION_MAX_AGE_SECS, secure)
}

/// Cookie that clears the session on the current host
#[must_use]
pub fn cleared_cookie(secure: bool) -> Cookie<'static> {
    build_cookie(String::new(), 0, secure)
}

fn build_cookie(value: String, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .max_age(time::Duration::seconds(max_age_secs))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}
