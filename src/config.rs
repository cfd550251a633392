//! Configuration management

use std::{env, path::Path, time::Duration};

use figment::{
    Figment,
    providers::{Env, Format, Json, Yaml},
};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Google OAuth2 authorization endpoint
pub const DEFAULT_AUTHORIZATION_URL: &str = "https://accounts.google.com/o/oauth2/auth";
/// Google OAuth2 token endpoint
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.google.com/o/oauth2/token";
/// Google userinfo endpoint
pub const DEFAULT_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v1/userinfo?alt=json";

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Environment files to load before processing config.
    /// Paths support ~ expansion. Loaded in order, later files override earlier.
    pub env_files: Vec<String>,
    /// Hub hostname: serves the provider callback and the profile page
    pub host: String,
    /// Listener configuration
    pub server: ServerConfig,
    /// Identity provider configuration
    pub oauth: OAuthConfig,
    /// Frontend host to backend mappings
    pub routes: Vec<RouteConfig>,
    /// Session cache configuration
    pub session: SessionConfig,
}

/// Listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind: String,
    /// Port to listen on; also appended to every public host name unless 80/443
    pub port: u16,
    /// Scheme browsers use to reach the gateway (`http` or `https`)
    pub scheme: String,
    /// Connect timeout for backend requests
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 80,
            scheme: "http".to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Identity provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthConfig {
    /// OAuth client id (supports `env:VAR_NAME`)
    #[serde(alias = "client-id")]
    pub client_id: String,
    /// OAuth client secret (supports `env:VAR_NAME`)
    #[serde(alias = "client-secret")]
    pub client_secret: String,
    /// Organization domain, e.g. `example.com`. Users must have an
    /// `@example.com` address; also sent to the provider as a hint.
    pub domain: String,
    /// Authorization endpoint
    pub authorization_url: String,
    /// Token endpoint
    pub token_url: String,
    /// Profile endpoint
    pub userinfo_url: String,
    /// Requested scopes
    pub scopes: Vec<String>,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            domain: String::new(),
            authorization_url: DEFAULT_AUTHORIZATION_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            userinfo_url: DEFAULT_USERINFO_URL.to_string(),
            scopes: vec![
                "https://www.googleapis.com/auth/userinfo.profile".to_string(),
                "https://www.googleapis.com/auth/userinfo.email".to_string(),
            ],
        }
    }
}

impl OAuthConfig {
    /// Domain without a leading `@`, as sent in the provider hint
    #[must_use]
    pub fn domain_hint(&self) -> &str {
        self.domain.trim_start_matches('@')
    }

    /// Suffix every accepted email must end with
    #[must_use]
    pub fn email_suffix(&self) -> String {
        format!("@{}", self.domain_hint())
    }

    /// Resolve the client id (expand `env:` references)
    #[must_use]
    pub fn resolve_client_id(&self) -> String {
        resolve_env_ref(&self.client_id)
    }

    /// Resolve the client secret (expand `env:` references)
    #[must_use]
    pub fn resolve_client_secret(&self) -> String {
        resolve_env_ref(&self.client_secret)
    }
}

fn resolve_env_ref(value: &str) -> String {
    if let Some(var_name) = value.strip_prefix("env:") {
        env::var(var_name).unwrap_or_else(|_| value.to_string())
    } else {
        value.to_string()
    }
}

/// A frontend host and the backend it proxies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Public host name (without port)
    pub from: String,
    /// Backend `host[:port]` or absolute `http(s)://` URL
    pub to: String,
}

/// Session cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum number of verified tokens kept in memory
    pub cache_capacity: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { cache_capacity: 50 }
    }
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// Files ending in `.json` are read as JSON, everything else as YAML.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            let is_json = p
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
            figment = if is_json {
                figment.merge(Json::file(p))
            } else {
                figment.merge(Yaml::file(p))
            };
        }

        figment = figment.merge(Env::prefixed("SSO_GATEWAY_").split("__"));

        let mut config: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        config.load_env_files();
        config.expand_env_vars();
        config.validate()?;

        Ok(config)
    }

    /// Check the fields the gateway cannot run without
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::Config("`host` (hub hostname) is required".to_string()));
        }
        if self.oauth.resolve_client_id().is_empty() {
            return Err(Error::Config("`oauth.client_id` is required".to_string()));
        }
        if self.oauth.domain_hint().is_empty() {
            return Err(Error::Config("`oauth.domain` is required".to_string()));
        }
        if self.routes.is_empty() {
            return Err(Error::Config("at least one route is required".to_string()));
        }
        if !matches!(self.server.scheme.as_str(), "http" | "https") {
            return Err(Error::Config(format!(
                "unsupported scheme: {}",
                self.server.scheme
            )));
        }
        Ok(())
    }

    /// Load environment files into the process environment.
    /// Supports ~ expansion. Files that don't exist are silently skipped.
    fn load_env_files(&self) {
        for path_str in &self.env_files {
            let expanded = if path_str.starts_with('~') {
                if let Some(home) = dirs::home_dir() {
                    path_str.replacen('~', &home.display().to_string(), 1)
                } else {
                    path_str.clone()
                }
            } else {
                path_str.clone()
            };

            let path = Path::new(&expanded);
            if path.exists() {
                match dotenvy::from_path(path) {
                    Ok(()) => tracing::info!("Loaded env file: {expanded}"),
                    Err(e) => tracing::warn!("Failed to load env file {expanded}: {e}"),
                }
            } else {
                tracing::debug!("Env file not found (skipped): {expanded}");
            }
        }
    }

    /// Expand ${VAR} and ${VAR:-default} patterns in OAuth credentials and routes
    fn expand_env_vars(&mut self) {
        let Ok(re) = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}") else {
            return;
        };

        for value in [
            &mut self.oauth.client_id,
            &mut self.oauth.client_secret,
            &mut self.oauth.domain,
        ] {
            *value = Self::expand_string(&re, value);
        }

        for route in &mut self.routes {
            route.to = Self::expand_string(&re, &route.to);
        }
    }

    fn expand_string(re: &Regex, value: &str) -> String {
        re.replace_all(value, |caps: &regex::Captures| {
            let var_name = &caps[1];
            let default = caps.get(2).map_or("", |m| m.as_str());
            env::var(var_name).unwrap_or_else(|_| default.to_string())
        })
        .into_owned()
    }
}

/// Custom humantime serde module for Duration
pub mod humantime_serde {
    use std::time::Duration;

    use serde::{self, Deserialize, Deserializer, Serializer};

    /// Serialize Duration to human-readable string (e.g., "30s")
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{}s", duration.as_secs()))
    }

    /// Deserialize human-readable duration string (e.g., "30s", "5m", "100ms")
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        if let Some(ms) = s.strip_suffix("ms") {
            ms.parse::<u64>()
                .map(Duration::from_millis)
                .map_err(serde::de::Error::custom)
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(serde::de::Error::custom)
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.parse::<u64>()
                .map(|m| Duration::from_secs(m * 60))
                .map_err(serde::de::Error::custom)
        } else {
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(serde::de::Error::custom)
        }
    }
}
