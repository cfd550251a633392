//! SSO Gateway Library
//!
//! Single-sign-on reverse proxy: puts a set of independently hosted backends
//! behind one organization-restricted OAuth2 login.
//!
//! # Features
//!
//! - **Host routing**: one listener, many frontend hosts, each mapped to a backend
//! - **Signed sessions**: HMAC-SHA256 tokens, no server-side session store
//! - **Cross-host bridge**: a login on the hub is carried to every frontend host
//!   through a redirect handshake, so hosts need not share a cookie domain
//! - **Identity headers**: backends receive the user's email and name
//! - **Streaming proxy**: request and response bodies are never buffered
//!
//! Token primitives live in [`sso_core`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod oauth;
pub mod session;

pub use error::{Error, Result};
pub use sso_core;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => subscriber
            .with(fmt::layer().json())
            .try_init()
            .map_err(|e| Error::Internal(format!("Failed to install subscriber: {e}"))),
        _ => subscriber
            .with(fmt::layer())
            .try_init()
            .map_err(|e| Error::Internal(format!("Failed to install subscriber: {e}"))),
    }
}
