//! Route table and host canonicalization

use std::collections::HashMap;

use url::Url;

use crate::config::RouteConfig;
use crate::{Error, Result};

/// Path prefix of the gateway's own endpoints on every host
pub const AUTH_PATH_PREFIX: &str = "/__auth__/";

/// Logout endpoint on every host
pub const LOGOUT_PATH: &str = "/__auth__/logout";

/// Public host name for `name` when the gateway listens on `port`
#[must_use]
pub fn host_of(name: &str, port: u16) -> String {
    match port {
        80 | 443 => name.to_string(),
        _ => format!("{name}:{port}"),
    }
}

/// Normalize an inbound `Host`/authority for route lookup
#[must_use]
pub fn canonical_host(authority: &str) -> String {
    let host = authority.trim().to_ascii_lowercase();
    for default_port in [":80", ":443"] {
        if let Some(stripped) = host.strip_suffix(default_port) {
            return stripped.to_string();
        }
    }
    host
}

/// One frontend host and its backend
#[derive(Debug, Clone)]
pub struct Route {
    /// Canonical public host, including a non-default port
    pub host: String,
    backend: Url,
}

impl Route {
    /// Backend base URL
    #[must_use]
    pub fn backend(&self) -> &Url {
        &self.backend
    }

    /// Absolute backend URL for an inbound path and query
    #[must_use]
    pub fn target_url(&self, path_and_query: &str) -> String {
        let origin = self.backend.origin().ascii_serialization();
        let prefix = self.backend.path().trim_end_matches('/');
        format!("{origin}{prefix}{path_and_query}")
    }
}

/// Immutable host → route map, built once at startup
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, Route>,
}

impl RouteTable {
    /// Build the table from configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error on a duplicate `from` host or a `to`
    /// that is not a usable backend address.
    pub fn from_config(routes: &[RouteConfig], port: u16) -> Result<Self> {
        let mut table = HashMap::with_capacity(routes.len());

        for route in routes {
            let host = canonical_host(&host_of(route.from.trim(), port));
            if host.is_empty() {
                return Err(Error::Config("route with empty `from`".to_string()));
            }
            let backend = parse_backend(&route.to)?;

            if table.contains_key(&host) {
                return Err(Error::Config(format!("duplicate route for host {host}")));
            }
            table.insert(host.clone(), Route { host, backend });
        }

        Ok(Self { routes: table })
    }

    /// Route for a canonical host
    #[must_use]
    pub fn get(&self, host: &str) -> Option<&Route> {
        self.routes.get(host)
    }

    /// Whether `host` is a frontend host
    #[must_use]
    pub fn contains(&self, host: &str) -> bool {
        self.routes.contains_key(host)
    }

    /// Number of routes
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the table has no routes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Routes sorted by host
    #[must_use]
    pub fn sorted(&self) -> Vec<&Route> {
        let mut routes: Vec<_> = self.routes.values().collect();
        routes.sort_by(|a, b| a.host.cmp(&b.host));
        routes
    }
}

fn parse_backend(to: &str) -> Result<Url> {
    let to = to.trim();
    let candidate = if to.contains("://") {
        to.to_string()
    } else {
        format!("http://{to}")
    };

    let url = Url::parse(&candidate)
        .map_err(|e| Error::Config(format!("Invalid route target '{to}': {e}")))?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(Error::Config(format!(
            "Route target must be an http(s) host: {to}"
        )));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(Error::Config(format!(
            "Route target must not carry a query or fragment: {to}"
        )));
    }
    Ok(url)
}
