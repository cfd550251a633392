//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Single-sign-on gateway - host-routed reverse proxy behind an OAuth2 login
#[derive(Parser, Debug)]
#[command(name = "sso-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML or JSON)
    #[arg(
        short,
        long,
        env = "SSO_GATEWAY_CONFIG",
        default_value = "sso-gateway.yaml",
        global = true
    )]
    pub config: PathBuf,

    /// Port to listen on
    #[arg(short, long, env = "SSO_GATEWAY_PORT")]
    pub port: Option<u16>,

    /// Address to bind to
    #[arg(long, env = "SSO_GATEWAY_BIND")]
    pub bind: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long,
        default_value = "info",
        env = "SSO_GATEWAY_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "SSO_GATEWAY_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Subcommand (optional - defaults to server mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the gateway server (default)
    Serve,

    /// Load and validate the configuration, then print the route table
    Check,
}
