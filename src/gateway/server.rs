//! Gateway server

use std::net::SocketAddr;
use std::sync::Arc;

use sso_core::SecretKey;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use super::router::{AppState, create_router};
use crate::config::Config;
use crate::oauth::IdentityProvider;
use crate::session::BoundedSessionCache;
use crate::{Error, Result};

/// SSO gateway server
pub struct Gateway {
    /// Configuration
    config: Config,
    /// State shared by every request
    state: Arc<AppState>,
}

impl Gateway {
    /// Create a new gateway with a freshly generated signing key.
    ///
    /// Sessions do not survive a restart.
    ///
    /// # Errors
    ///
    /// Returns an error if the route table is invalid.
    pub fn new(config: Config, provider: Arc<dyn IdentityProvider>) -> Result<Self> {
        let cache = Arc::new(BoundedSessionCache::new(config.session.cache_capacity));
        let state = AppState::from_config(&config, SecretKey::generate(), cache, provider)?;

        for route in state.routes.sorted() {
            info!(host = %route.host, backend = %route.backend(), "Registered route");
        }

        Ok(Self {
            config,
            state: Arc::new(state),
        })
    }

    /// Shared state
    #[must_use]
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Run the gateway until Ctrl-C or SIGTERM
    pub async fn run(self) -> Result<()> {
        let addr = SocketAddr::new(
            self.config
                .server
                .bind
                .parse()
                .map_err(|e| Error::Config(format!("Invalid bind address: {e}")))?,
            self.config.server.port,
        );

        let app = create_router(Arc::clone(&self.state));
        let listener = TcpListener::bind(addr).await?;

        info!("============================================================");
        info!("SSO GATEWAY v{}", env!("CARGO_PKG_VERSION"));
        info!("============================================================");
        info!(bind = %self.config.server.bind, port = self.config.server.port, "Listening");
        info!(
            "Hub: {}://{}/",
            self.state.scheme, self.state.hub_host
        );
        info!(
            domain = %self.state.domain_hint,
            routes = self.state.routes.len(),
            cache_capacity = self.config.session.cache_capacity,
            "Sessions"
        );
        if !self.state.secure_cookies() {
            warn!("Public scheme is http - session cookies are sent without Secure");
        }
        info!("============================================================");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Internal(e.to_string()))?;

        info!("Gateway stopped");
        Ok(())
    }
}

/// Shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
