//! Axum server setup
//!
//! Server skeleton with:
//! - Localhost-only CORS by default
//! - Tracing middleware
//! - Request body limit sized from the upload limit
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::routes;
use crate::config::{AppConfig, ConfigError};
use crate::service::FileService;

/// Room for the JSON envelope around a base64 payload.
const BODY_ENVELOPE_BYTES: usize = 16 * 1024;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:50051)
    pub bind_addr: SocketAddr,

    /// Allow permissive CORS (default: false = localhost only)
    pub cors_permissive: bool,

    /// Server-side deadline applied to every request
    pub request_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 50051)),
            cors_permissive: false,
            request_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl ServerConfig {
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: config.listen_addr()?,
            cors_permissive: config.server.cors_permissive,
            request_timeout: config.server.request_timeout(),
        })
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: FileService,
    pub request_timeout: Option<Duration>,
}

impl AppState {
    pub fn new(service: FileService, request_timeout: Option<Duration>) -> Self {
        Self {
            service,
            request_timeout,
        }
    }
}

/// Build the application router with all routes
pub fn build_router(state: AppState, cors_permissive: bool) -> Router {
    let body_limit = body_limit(state.service.max_upload_bytes());

    let cors = if cors_permissive {
        tracing::warn!("CORS: Permissive mode enabled - all origins allowed");
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin([
                HeaderValue::from_static("http://localhost:3000"),
                HeaderValue::from_static("http://localhost:50051"),
                HeaderValue::from_static("http://127.0.0.1:3000"),
                HeaderValue::from_static("http://127.0.0.1:50051"),
            ])
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .merge(routes::health::router())
        .merge(routes::files::router())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Request body cap for a decoded upload limit. base64 inflates payloads by 4/3.
fn body_limit(max_upload_bytes: usize) -> usize {
    (max_upload_bytes / 3)
        .saturating_mul(4)
        .saturating_add(4)
        .saturating_add(BODY_ENVELOPE_BYTES)
}

/// Run the HTTP server until a shutdown signal arrives.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool(&config.postgres).await?;
/// let service = FileService::new(Arc::new(PgFileRepository::new(pool)), &config.server);
/// run_server(service, ServerConfig::from_app_config(&config)?).await?;
/// ```
pub async fn run_server(service: FileService, config: ServerConfig) -> Result<(), ServerError> {
    let state = AppState::new(service, config.request_timeout);
    let app = build_router(state, config.cors_permissive);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 50051);
        assert!(!config.cors_permissive);
    }

    #[test]
    fn body_limit_covers_base64_and_saturates() {
        assert!(body_limit(3 * 1024) >= 4 * 1024 + BODY_ENVELOPE_BYTES);
        assert_eq!(body_limit(usize::MAX), usize::MAX);
    }

    #[test]
    fn from_app_config_copies_settings() {
        let mut app = AppConfig::default();
        app.listen.host = "127.0.0.1".into();
        app.listen.port = 8081;
        app.server.request_timeout_secs = 0;
        app.server.cors_permissive = true;

        let config = ServerConfig::from_app_config(&app).unwrap();
        assert_eq!(config.bind_addr.port(), 8081);
        assert!(config.cors_permissive);
        assert_eq!(config.request_timeout, None);
    }
}
