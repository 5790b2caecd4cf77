//! Web server.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::service::DriveService;
use crate::{DspaceError, Result};

use super::handlers::AppState;
use super::router::{create_health_router, create_router};

/// Web server for the API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Allowed CORS origins.
    cors_origins: Vec<String>,
    /// Request body limit in bytes.
    max_body: usize,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(config: &ServerConfig, service: DriveService) -> Result<Self> {
        let addr = format!("{}:{}", config.host, config.port)
            .parse()
            .map_err(|e| DspaceError::Config(format!("invalid server address: {e}")))?;

        Ok(Self {
            addr,
            app_state: Arc::new(AppState::new(service)),
            cors_origins: config.cors_origins.clone(),
            max_body: config.max_request_size(),
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn router(self) -> axum::Router {
        create_router(self.app_state, &self.cors_origins, self.max_body)
            .merge(create_health_router())
    }

    /// Run the web server.
    pub async fn run(self) -> std::result::Result<(), std::io::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        tracing::info!("Web server listening on http://{}", listener.local_addr()?);

        axum::serve(listener, self.router()).await
    }

    /// Run the server in the background and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::result::Result<SocketAddr, std::io::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Web server listening on http://{}", local_addr);

        let router = self.router();
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}
