//! Error types for the SSO gateway

use std::io;

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Result type alias for the SSO gateway
pub type Result<T> = std::result::Result<T, Error>;

/// SSO gateway errors
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session token is malformed or fails verification
    #[error("Invalid session token: {0}")]
    InvalidToken(#[from] sso_core::TokenError),

    /// Bridge-completion parameters missing or malformed
    #[error("Bridge protocol error: {0}")]
    BridgeProtocol(String),

    /// Login or bridge rejected; never answered with a redirect
    #[error("Authorization denied: {0}")]
    AuthorizationDenied(String),

    /// Outbound proxy call failed
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Wrong method on a method-restricted endpoint
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    /// Identity provider call failed
    #[error("Identity provider error: {0}")]
    Provider(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// HTTP status used when this error reaches the request boundary
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BridgeProtocol(_) => StatusCode::BAD_REQUEST,
            Self::InvalidToken(_) | Self::AuthorizationDenied(_) => StatusCode::FORBIDDEN,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::BackendUnavailable(_) | Self::Http(_) => StatusCode::BAD_GATEWAY,
            Self::Provider(_) => StatusCode::FORBIDDEN,
            Self::Config(_) | Self::Io(_) | Self::Json(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        }

        let body = format!("{}\n", status.canonical_reason().unwrap_or("Error"));
        let mut response = (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            body,
        )
            .into_response();

        if matches!(self, Self::MethodNotAllowed(_)) {
            response
                .headers_mut()
                .insert(header::ALLOW, header::HeaderValue::from_static("POST"));
        }
        response
    }
}
