// src/server/mod.rs
// =============================================================================
// This module runs an embedded static file server over a rendered site.
//
// A live crawl needs something to crawl. `start` binds a local port, serves
// the directory with tower-http's ServeDir (index.html for directories,
// redirects for missing trailing slashes), and returns a handle. `shutdown`
// stops accepting connections, lets in-flight requests finish, and waits
// for the server task to exit.
//
// Dropping a handle without calling `shutdown` still signals the server to
// stop, so a server never outlives the crawl it was started for.
// =============================================================================

use axum::Router;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("server failed: {0}")]
    Serve(#[from] std::io::Error),

    #[error("server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

// How to run the embedded server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directory of rendered files to serve
    pub root: PathBuf,
    /// Port on localhost; 0 picks a free one
    pub port: u16,
    /// If false, every request is traced at debug level
    pub quiet: bool,
}

// A running server
#[derive(Debug)]
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<std::io::Result<()>>>,
}

// Starts serving `config.root` on localhost
pub async fn start(config: &ServerConfig) -> Result<ServerHandle, ServerError> {
    let mut app = Router::new().fallback_service(ServeDir::new(&config.root));
    if !config.quiet {
        app = app.layer(TraceLayer::new_for_http());
    }

    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], config.port)))
        .await
        .map_err(|source| ServerError::Bind {
            port: config.port,
            source,
        })?;
    let addr = listener.local_addr()?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                // Either an explicit signal or the sender being dropped
                let _ = shutdown_rx.await;
            })
            .await
    });

    info!("Serving {} on http://{}", config.root.display(), addr);

    Ok(ServerHandle {
        addr,
        shutdown: Some(shutdown_tx),
        task: Some(task),
    })
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base address to build page URLs from, e.g. "http://127.0.0.1:41234"
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    // Stops the server and waits for it to exit
    pub async fn shutdown(mut self) -> Result<(), ServerError> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            task.await??;
        }
        info!("Server on {} stopped", self.addr);
        Ok(())
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}
