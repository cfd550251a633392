//! Request classification
//!
//! Pure functions of the request path, decided before any side effect.

use super::routes::{AUTH_PATH_PREFIX, LOGOUT_PATH};

/// What a frontend (route) host does with a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Bridge completion: set this host's cookie from `c`, redirect to `p`
    CompleteBridge,
    /// Clear this host's cookie
    Logout,
    /// Resolve the session and forward to the backend
    ProxyRequest,
}

impl Dispatch {
    /// Classify a frontend request path
    #[must_use]
    pub fn for_path(path: &str) -> Self {
        if path == LOGOUT_PATH {
            Self::Logout
        } else if path.starts_with(AUTH_PATH_PREFIX) {
            Self::CompleteBridge
        } else {
            Self::ProxyRequest
        }
    }
}

/// What the hub does with a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubDispatch {
    /// Identity provider callback (`code` + `state`)
    ProviderCallback,
    /// Clear the hub cookie
    Logout,
    /// Who am I
    Profile,
    /// Anything else
    NotFound,
}

impl HubDispatch {
    /// Classify a hub request path
    #[must_use]
    pub fn for_path(path: &str) -> Self {
        match path {
            LOGOUT_PATH => Self::Logout,
            "/" => Self::Profile,
            p if p.starts_with(AUTH_PATH_PREFIX) => Self::ProviderCallback,
            _ => Self::NotFound,
        }
    }
}
