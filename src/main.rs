//! SSO Gateway - host-routed reverse proxy behind an OAuth2 login

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use sso_gateway::{
    cli::{Cli, Command},
    config::Config,
    gateway::{Gateway, RouteTable},
    oauth::OAuthProvider,
    setup_tracing,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    let config = match Config::load(Some(cli.config.as_path())) {
        Ok(mut config) => {
            // Apply CLI overrides
            if let Some(port) = cli.port {
                config.server.port = port;
            }
            if let Some(ref bind) = cli.bind {
                config.server.bind.clone_from(bind);
            }
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Some(Command::Check) => run_check(&config),
        Some(Command::Serve) | None => run_server(config).await,
    }
}

/// Validate the configuration and print the route table
fn run_check(config: &Config) -> ExitCode {
    let routes = match RouteTable::from_config(&config.routes, config.server.port) {
        Ok(routes) => routes,
        Err(e) => {
            eprintln!("❌ {e}");
            return ExitCode::FAILURE;
        }
    };

    println!("✅ Configuration valid\n");
    println!(
        "Hub:    {}://{}",
        config.server.scheme,
        sso_gateway::gateway::routes::host_of(&config.host, config.server.port)
    );
    println!("Domain: {}", config.oauth.email_suffix());
    println!("\nRoutes:");
    for route in routes.sorted() {
        println!("  {} -> {}", route.host, route.backend());
    }
    ExitCode::SUCCESS
}

/// Run the gateway server
async fn run_server(config: Config) -> ExitCode {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.server.port,
        routes = config.routes.len(),
        "Starting SSO Gateway"
    );

    let http_client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build HTTP client: {e}");
            return ExitCode::FAILURE;
        }
    };

    let provider = match OAuthProvider::from_config(&config, http_client) {
        Ok(p) => Arc::new(p),
        Err(e) => {
            error!("Failed to configure identity provider: {e}");
            return ExitCode::FAILURE;
        }
    };
    info!(redirect_uri = %provider.redirect_uri(), "Identity provider configured");

    let gateway = match Gateway::new(config, provider) {
        Ok(g) => g,
        Err(e) => {
            error!("Failed to create gateway: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = gateway.run().await {
        error!("Gateway error: {e}");
        return ExitCode::FAILURE;
    }

    info!("Gateway shutdown complete");
    ExitCode::SUCCESS
}
