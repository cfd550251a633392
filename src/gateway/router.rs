//! HTTP router and host dispatch

use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use reqwest::redirect::Policy;
use sso_core::SecretKey;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::debug;

use super::bridge;
use super::dispatch::{Dispatch, HubDispatch};
use super::proxy;
use super::routes::{RouteTable, canonical_host, host_of};
use crate::Result;
use crate::config::Config;
use crate::oauth::IdentityProvider;
use crate::session::{self, SessionCache};

/// Shared application state, built once at startup
pub struct AppState {
    /// Signing key for session tokens
    pub key: SecretKey,
    /// Frontend host → backend
    pub routes: RouteTable,
    /// Canonical hub host
    pub hub_host: String,
    /// Scheme browsers use to reach the gateway
    pub scheme: String,
    /// Suffix every accepted email must end with, e.g. `@org.com`
    pub email_suffix: String,
    /// Domain hint passed to the provider
    pub domain_hint: String,
    /// Verified-token cache shared by all hosts
    pub cache: Arc<dyn SessionCache>,
    /// Identity provider
    pub provider: Arc<dyn IdentityProvider>,
    /// Backend HTTP client
    pub client: reqwest::Client,
}

impl AppState {
    /// Build the state from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the route table is invalid or the backend client
    /// cannot be built.
    pub fn from_config(
        config: &Config,
        key: SecretKey,
        cache: Arc<dyn SessionCache>,
        provider: Arc<dyn IdentityProvider>,
    ) -> Result<Self> {
        let routes = RouteTable::from_config(&config.routes, config.server.port)?;
        let client = reqwest::Client::builder()
            .redirect(Policy::none())
            .no_gzip()
            .no_brotli()
            .no_deflate()
            .connect_timeout(config.server.connect_timeout)
            .build()?;

        Ok(Self {
            key,
            routes,
            hub_host: canonical_host(&host_of(&config.host, config.server.port)),
            scheme: config.server.scheme.clone(),
            email_suffix: config.oauth.email_suffix(),
            domain_hint: config.oauth.domain_hint().to_string(),
            cache,
            provider,
            client,
        })
    }

    /// Whether cookies carry the `Secure` attribute
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.scheme == "https"
    }
}

/// Create the router
///
/// Every request lands in one handler that dispatches on the `Host`.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .fallback(dispatch_handler)
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn dispatch_handler(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let host = request_host(&request);

    let result = if let Some(route) = state.routes.get(&host) {
        let dispatch = Dispatch::for_path(request.uri().path());
        debug!(host = %host, ?dispatch, "Frontend request");
        match dispatch {
            Dispatch::CompleteBridge => {
                bridge::complete_bridge(&state, &host, request.uri().query())
            }
            Dispatch::Logout => bridge::logout(&state, &host, request.method()),
            Dispatch::ProxyRequest => {
                let identity = session::identity_from_headers(
                    request.headers(),
                    state.cache.as_ref(),
                    &state.key,
                );
                match identity {
                    Some(identity) => proxy::forward(&state, route, &identity, request).await,
                    None => bridge::authorization_redirect(&state, route, request.uri()),
                }
            }
        }
    } else {
        let dispatch = HubDispatch::for_path(request.uri().path());
        debug!(host = %host, hub = %state.hub_host, ?dispatch, "Hub request");
        match dispatch {
            HubDispatch::ProviderCallback => {
                bridge::provider_callback(&state, request.uri().query()).await
            }
            HubDispatch::Logout => bridge::logout(&state, &host, request.method()),
            HubDispatch::Profile => Ok(bridge::profile(&state, request.headers())),
            HubDispatch::NotFound => Ok(not_found()),
        }
    };

    result.unwrap_or_else(IntoResponse::into_response)
}

/// Canonical host of a request: URI authority first, then `Host`
fn request_host(request: &Request) -> String {
    let authority = request
        .uri()
        .authority()
        .map(|a| a.as_str().to_string())
        .or_else(|| {
            request
                .headers()
                .get(header::HOST)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
        .unwrap_or_default();
    canonical_host(&authority)
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "Not Found\n",
    )
        .into_response()
}
