//! HTTP server listener
//!
//! Binds the socket and serves the routes; `axum::serve` gives every
//! connection its own task, so a slow viewer only ever stalls itself.

use std::net::SocketAddr;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;

use crate::error::Result;
use crate::relay::{FrameStore, Shutdown};
use crate::server::config::ServerConfig;
use crate::server::routes::{self, AppState};

/// MJPEG relay HTTP server
pub struct RelayServer {
    config: ServerConfig,
    store: Arc<FrameStore>,
    shutdown: Shutdown,
    next_session_id: Arc<AtomicU64>,
    session_limit: Option<Arc<Semaphore>>,
}

impl RelayServer {
    /// Create a server streaming from `store`
    ///
    /// Triggering `shutdown` stops accepting connections and ends every
    /// open stream.
    pub fn new(config: ServerConfig, store: Arc<FrameStore>, shutdown: Shutdown) -> Self {
        let session_limit = if config.max_sessions > 0 {
            Some(Arc::new(Semaphore::new(config.max_sessions)))
        } else {
            None
        };

        Self {
            config,
            store,
            shutdown,
            next_session_id: Arc::new(AtomicU64::new(1)),
            session_limit,
        }
    }

    /// Get a reference to the frame store
    pub fn store(&self) -> &Arc<FrameStore> {
        &self.store
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Number of stream sessions currently open, if a limit is configured
    pub fn active_sessions(&self) -> Option<usize> {
        self.session_limit
            .as_ref()
            .map(|sem| self.config.max_sessions - sem.available_permits())
    }

    /// Build the router
    pub fn router(&self) -> Router {
        routes::router(AppState {
            store: Arc::clone(&self.store),
            session_config: self.config.session.clone(),
            shutdown: self.shutdown.clone(),
            next_session_id: Arc::clone(&self.next_session_id),
            session_limit: self.session_limit.clone(),
        })
    }

    /// Bind and serve until shutdown
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener until shutdown
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(addr = %addr, "Relay server listening");

        let mut shutdown = self.shutdown.listener();
        let app = self
            .router()
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.wait().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!(addr = %addr, "Relay server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlimited_sessions() {
        let server = RelayServer::new(
            ServerConfig::default(),
            Arc::new(FrameStore::new()),
            Shutdown::new(),
        );

        assert!(server.active_sessions().is_none());
        assert_eq!(server.bind_addr().port(), 8283);
    }

    #[test]
    fn test_session_limit_starts_empty() {
        let server = RelayServer::new(
            ServerConfig::default().max_sessions(3),
            Arc::new(FrameStore::new()),
            Shutdown::new(),
        );

        assert_eq!(server.active_sessions(), Some(0));
    }

    #[tokio::test]
    async fn test_serve_returns_on_shutdown() {
        let shutdown = Shutdown::new();
        let server = RelayServer::new(
            ServerConfig::default(),
            Arc::new(FrameStore::new()),
            shutdown.clone(),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        shutdown.trigger();
        let result =
            tokio::time::timeout(std::time::Duration::from_secs(2), server.serve(listener)).await;
        assert!(result.unwrap().is_ok());
    }
}
