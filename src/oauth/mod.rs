//! Identity provider capability
//!
//! The gateway only needs three things from an OAuth2 identity provider:
//! - an authorization URL carrying an opaque `state`
//! - the authorization-code exchange
//! - the user profile for an access token
//!
//! [`OAuthProvider`] talks to a real provider over HTTP; tests substitute
//! their own [`IdentityProvider`].

mod provider;

use async_trait::async_trait;
use sso_core::Identity;

use crate::Result;

pub use provider::OAuthProvider;

/// OAuth2 authorization-code identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL the browser is sent to for login. `state` is returned verbatim on
    /// the callback; `domain_hint` restricts the account chooser.
    fn authorization_url(&self, state: &str, domain_hint: &str) -> Result<String>;

    /// Exchange an authorization code for an access token
    async fn exchange(&self, code: &str) -> Result<String>;

    /// Fetch the profile of the user the access token belongs to
    async fn fetch_profile(&self, access_token: &str) -> Result<Identity>;
}
