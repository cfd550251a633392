//! HTTP identity provider client

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use sso_core::Identity;
use tracing::debug;
use url::Url;

use super::IdentityProvider;
use crate::config::Config;
use crate::gateway::routes::{AUTH_PATH_PREFIX, host_of};
use crate::{Error, Result};

/// OAuth token response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// OAuth2 client for the configured provider (Google by default)
pub struct OAuthProvider {
    http_client: Client,
    client_id: String,
    client_secret: String,
    authorization_url: Url,
    token_url: String,
    userinfo_url: String,
    redirect_uri: String,
    scopes: Vec<String>,
}

impl OAuthProvider {
    /// Build the provider from configuration.
    ///
    /// The redirect URI is the hub's callback endpoint,
    /// `<scheme>://<host>/__auth__/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the authorization endpoint is not a valid URL.
    pub fn from_config(config: &Config, http_client: Client) -> Result<Self> {
        let authorization_url = Url::parse(&config.oauth.authorization_url).map_err(|e| {
            Error::Config(format!(
                "Invalid authorization_url '{}': {e}",
                config.oauth.authorization_url
            ))
        })?;

        Ok(Self {
            http_client,
            client_id: config.oauth.resolve_client_id(),
            client_secret: config.oauth.resolve_client_secret(),
            authorization_url,
            token_url: config.oauth.token_url.clone(),
            userinfo_url: config.oauth.userinfo_url.clone(),
            redirect_uri: format!(
                "{}://{}{}",
                config.server.scheme,
                host_of(&config.host, config.server.port),
                AUTH_PATH_PREFIX
            ),
            scopes: config.oauth.scopes.clone(),
        })
    }

    /// Callback URL registered with the provider
    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }
}

#[async_trait]
impl IdentityProvider for OAuthProvider {
    fn authorization_url(&self, state: &str, domain_hint: &str) -> Result<String> {
        let mut url = self.authorization_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("response_type", "code")
                .append_pair("client_id", &self.client_id)
                .append_pair("redirect_uri", &self.redirect_uri)
                .append_pair("scope", &self.scopes.join(" "))
                .append_pair("state", state);
            if !domain_hint.is_empty() {
                query.append_pair("hd", domain_hint);
            }
        }
        Ok(url.into())
    }

    async fn exchange(&self, code: &str) -> Result<String> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::Provider(format!("Token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Provider(format!(
                "Token exchange failed: HTTP {status} - {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::Provider(format!("Failed to parse token response: {e}")))?;

        debug!("Exchanged authorization code");
        Ok(token.access_token)
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<Identity> {
        let response = self
            .http_client
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| Error::Provider(format!("Profile request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Provider(format!(
                "Profile fetch failed: HTTP {status}"
            )));
        }

        response
            .json::<Identity>()
            .await
            .map_err(|e| Error::Provider(format!("Failed to parse profile: {e}")))
    }
}
