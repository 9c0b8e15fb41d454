//! Preview server for a built site.

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::http::{header, HeaderValue};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;

use quire_static::BuildError;

use crate::supervisor::SupervisorError;

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Initial build failed: {0}")]
    Build(#[from] BuildError),

    #[error("File watch error: {0}")]
    WatchError(#[from] notify::Error),

    #[error(transparent)]
    Supervisor(#[from] SupervisorError),

    #[error("Invalid address {0}")]
    InvalidAddress(String),

    #[error("Failed to bind to {0}: {1}")]
    BindError(SocketAddr, String),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Build task failed: {0}")]
    Task(String),
}

/// Configuration for the preview server.
#[derive(Debug, Clone)]
pub struct PreviewConfig {
    /// Directory to serve
    pub dir: PathBuf,

    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Open browser on start
    pub open: bool,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("dist"),
            host: "127.0.0.1".to_string(),
            port: 3000,
            open: true,
        }
    }
}

/// Serves the output directory with caching disabled.
pub struct PreviewServer {
    config: PreviewConfig,
}

impl PreviewServer {
    /// Create a new preview server.
    pub fn new(config: PreviewConfig) -> Self {
        Self { config }
    }

    /// Router serving the output directory.
    ///
    /// Every response carries `Cache-Control: no-store` so the browser always
    /// sees the latest rebuild.
    pub fn router(&self) -> Router {
        Router::new()
            .fallback_service(ServeDir::new(&self.config.dir))
            .layer(SetResponseHeaderLayer::overriding(
                header::CACHE_CONTROL,
                HeaderValue::from_static("no-store, no-cache, must-revalidate"),
            ))
    }

    /// Bind and serve until Ctrl-C.
    pub async fn run(self) -> Result<(), ServerError> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|e| ServerError::InvalidAddress(format!("{}: {}", self.config.host, e)))?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        tracing::info!(
            "Serving {} at http://{}",
            self.config.dir.display(),
            addr
        );

        if self.config.open {
            let url = format!("http://{}", addr);
            if let Err(e) = open::that(&url) {
                tracing::debug!("Could not open browser: {}", e);
            }
        }

        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(ServerError::Io)
    }
}

/// Resolves on Ctrl-C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
