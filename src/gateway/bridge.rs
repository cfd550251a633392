//! Cross-host login bridge
//!
//! ```text
//! leaf (no session) ──302──▶ provider ──302──▶ hub /__auth__/?code&state
//!                                                  │ exchange, profile, sign
//!      leaf /__auth__/?p&c ◀──────────302──────────┘ (hub cookie set)
//!      │ verify c, set leaf cookie
//!      └──302──▶ p
//! ```
//!
//! Every failure after the provider round trip is a 400 or 403 without a
//! `Location`; a redirect from a failure state would loop straight back into
//! the login flow.

use std::collections::HashMap;

use axum::{
    Json,
    http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;
use tracing::{debug, info, warn};
use url::Url;

use super::router::AppState;
use super::routes::{AUTH_PATH_PREFIX, Route, canonical_host};
use crate::session::{self, cleared_cookie, session_cookie};
use crate::{Error, Result};

/// 302 to `location`.
///
/// # Errors
///
/// Returns [`Error::BridgeProtocol`] if `location` is not a valid header value.
pub fn found(location: &str) -> Result<Response> {
    let value = HeaderValue::from_str(location)
        .map_err(|_| Error::BridgeProtocol("redirect target is not a valid header value".into()))?;
    Ok((StatusCode::FOUND, [(header::LOCATION, value)]).into_response())
}

/// Send an unauthenticated frontend request to the identity provider.
///
/// The `state` is the absolute URL of the original request, so the hub knows
/// where to bridge the session back to.
pub fn authorization_redirect(state: &AppState, route: &Route, uri: &Uri) -> Result<Response> {
    let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());
    let original = format!("{}://{}{}", state.scheme, route.host, path_and_query);

    let location = state
        .provider
        .authorization_url(&original, &state.domain_hint)?;
    debug!(host = %route.host, path = %uri.path(), "No session, redirecting to provider");
    found(&location)
}

/// Hub: finish the provider round trip and bridge the session to the leaf.
pub async fn provider_callback(state: &AppState, query: Option<&str>) -> Result<Response> {
    let params = query_params(query);
    let (Some(code), Some(back)) = (non_empty(&params, "code"), non_empty(&params, "state")) else {
        return Err(denied("callback without code or state"));
    };

    let back = Url::parse(back).map_err(|_| denied("state is not a URL"))?;
    let Some(route) = state_route(state, &back) else {
        return Err(denied("state does not name a frontend host"));
    };

    let access_token = state
        .provider
        .exchange(code)
        .await
        .map_err(|e| denied(&format!("code exchange failed: {e}")))?;
    let identity = state
        .provider
        .fetch_profile(&access_token)
        .await
        .map_err(|e| denied(&format!("profile fetch failed: {e}")))?;

    if !identity.email_has_suffix(&state.email_suffix) {
        return Err(denied(&format!(
            "{} is outside {}",
            identity.email, state.email_suffix
        )));
    }

    let token = sso_core::encode(&identity, &state.key)
        .map_err(|e| Error::Internal(format!("Failed to sign session: {e}")))?;
    state.cache.put(&token, identity.clone());

    let resume = match back.query() {
        Some(q) => format!("{}?{q}", back.path()),
        None => back.path().to_string(),
    };
    let mut bridge = Url::parse(&format!(
        "{}://{}{}",
        state.scheme, route.host, AUTH_PATH_PREFIX
    ))
    .map_err(|e| Error::Internal(format!("Failed to build bridge URL: {e}")))?;
    bridge
        .query_pairs_mut()
        .append_pair("p", &resume)
        .append_pair("c", &token);

    info!(email = %identity.email, host = %route.host, "Login accepted");
    let jar = CookieJar::new().add(session_cookie(&token, state.secure_cookies()));
    Ok((jar, found(bridge.as_str())?).into_response())
}

/// Leaf: accept the token carried by the bridge and resume the original path.
pub fn complete_bridge(state: &AppState, host: &str, query: Option<&str>) -> Result<Response> {
    let params = query_params(query);
    let token = non_empty(&params, "c").unwrap_or_default();
    let resume = params.get("p").map_or("", String::as_str);

    if token.is_empty() || !is_local_path(resume) {
        warn!(host = %host, "Malformed bridge request");
        return Err(Error::BridgeProtocol(
            "bridge requires c and a local path p".into(),
        ));
    }

    let Some(identity) = session::resolve(token, state.cache.as_ref(), &state.key) else {
        warn!(host = %host, "Bridge token rejected");
        return Err(Error::AuthorizationDenied("bridge token rejected".into()));
    };

    debug!(host = %host, email = %identity.email, "Bridge complete");
    let jar = CookieJar::new().add(session_cookie(token, state.secure_cookies()));
    Ok((jar, found(resume)?).into_response())
}

/// Clear the session cookie on the host this is called on. POST only.
pub fn logout(state: &AppState, host: &str, method: &Method) -> Result<Response> {
    if *method != Method::POST {
        return Err(Error::MethodNotAllowed(method.to_string()));
    }

    info!(host = %host, "Logout");
    let jar = CookieJar::new().add(cleared_cookie(state.secure_cookies()));
    Ok((
        jar,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "ok.\n",
    )
        .into_response())
}

/// Hub `/`: the identity behind the hub cookie, or `null`
pub fn profile(state: &AppState, headers: &HeaderMap) -> Response {
    let user = session::identity_from_headers(headers, state.cache.as_ref(), &state.key);
    Json(json!({ "user": user })).into_response()
}

/// Route named by the callback `state` URL
fn state_route<'a>(state: &'a AppState, back: &Url) -> Option<&'a Route> {
    let host = back.host_str()?;
    let authority = match back.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    state.routes.get(&canonical_host(&authority))
}

/// A path on the current host: rooted, not protocol-relative
fn is_local_path(p: &str) -> bool {
    p.starts_with('/') && !p.starts_with("//") && !p.starts_with("/\\")
}

fn query_params(query: Option<&str>) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for (key, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
        params
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    params
}

fn non_empty<'a>(params: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}

fn denied(reason: &str) -> Error {
    warn!(reason = %reason, "Provider callback rejected");
    Error::AuthorizationDenied(reason.to_string())
}
