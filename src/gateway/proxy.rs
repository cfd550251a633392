//! Reverse proxy forwarder
//!
//! Request and response bodies are streamed, never buffered. Backend
//! redirects are passed to the browser as-is and compressed bodies are not
//! decoded.

use axum::{
    body::{Body, HttpBody},
    extract::Request,
    http::{HeaderMap, HeaderName, HeaderValue, header},
    response::Response,
};
use futures::TryStreamExt;
use sso_core::Identity;
use tracing::{debug, error, warn};

use super::router::AppState;
use super::routes::Route;
use crate::{Error, Result};

/// Escaped email of the authenticated user
pub const EMAIL_HEADER: &str = "x-sso-gateway-email";

/// Escaped display name of the authenticated user
pub const NAME_HEADER: &str = "x-sso-gateway-name";

/// Headers that describe a single connection and are never forwarded
fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-connection"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

/// Forward an authenticated request to the route's backend
pub async fn forward(
    state: &AppState,
    route: &Route,
    identity: &Identity,
    request: Request,
) -> Result<Response> {
    let (parts, body) = request.into_parts();
    let path_and_query = parts.uri.path_and_query().map_or("/", |pq| pq.as_str());
    let target = route.target_url(path_and_query);

    let mut headers = strip_hop_by_hop(&parts.headers);
    headers.remove(header::HOST);
    assert_identity(&mut headers, identity);

    let mut outbound = state
        .client
        .request(parts.method.clone(), &target)
        .headers(headers);
    if body.size_hint().exact() != Some(0) {
        let stream = body
            .into_data_stream()
            .inspect_err(|e| warn!(error = %e, "Client body stream failed"));
        outbound = outbound.body(reqwest::Body::wrap_stream(stream));
    }

    debug!(method = %parts.method, target = %target, "Forwarding");
    let backend = outbound.send().await.map_err(|e| {
        error!(backend = %route.backend(), error = %e, "Backend request failed");
        Error::BackendUnavailable(format!("{}: {e}", route.backend()))
    })?;

    let status = backend.status();
    let response_headers = strip_hop_by_hop(backend.headers());
    let stream = backend
        .bytes_stream()
        .inspect_err(|e| warn!(error = %e, "Backend body stream failed"));

    let mut response = Response::new(Body::from_stream(stream));
    *response.status_mut() = status;
    *response.headers_mut() = response_headers;
    Ok(response)
}

/// Replace any client-supplied identity headers with the gateway's own.
///
/// Values are form-URL-escaped so they are always valid header values.
pub fn assert_identity(headers: &mut HeaderMap, identity: &Identity) {
    headers.remove(EMAIL_HEADER);
    headers.remove(NAME_HEADER);
    headers.insert(EMAIL_HEADER, escaped(&identity.email));
    headers.insert(NAME_HEADER, escaped(&identity.name));
}

fn escaped(value: &str) -> HeaderValue {
    let encoded: String = url::form_urlencoded::byte_serialize(value.as_bytes()).collect();
    // form encoding only emits visible ASCII
    HeaderValue::from_str(&encoded).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// Copy of `headers` without hop-by-hop headers, including any the
/// `Connection` header names.
pub fn strip_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if is_hop_by_hop(name) || listed.contains(name) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}
