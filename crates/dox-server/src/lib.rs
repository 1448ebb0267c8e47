//! HTTP server for the dox documentation engine.
//!
//! Serves the content API over axum:
//! - `/api/docs`, `/api/docs/{*slug}`: documentation pages
//! - `/api/navigation`: the sidebar tree
//! - `/api/blog`, `/api/blog/tags`, `/api/blog/{slug}`: blog content
//! - `/ws/reload`: WebSocket live reload events (development)
//!
//! # Quick Start
//!
//! ```ignore
//! use dox_config::Config;
//! use dox_server::run_server;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::load(None, None).unwrap();
//!     run_server(config).await.unwrap();
//! }
//! ```

mod app;
mod handlers;
mod state;
mod ws;

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use dox_config::Config;
use dox_site::{ContentCache, DocLibrary};
use dox_watch::{ContentWatcher, WatcherState};
use state::AppState;
use tokio::sync::broadcast;

pub use handlers::ErrorResponse;

/// Run the server until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the bind address is invalid or the listener
/// fails to start.
pub async fn run_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let cache = Arc::new(ContentCache::new());
    let library = Arc::new(DocLibrary::from_config(&config, Arc::clone(&cache)));

    // Start the file watcher if live reload is enabled
    let watcher = if config.live_reload.enabled {
        let (tx, _rx) = broadcast::channel(100);
        let watcher = Arc::new(
            ContentWatcher::new(
                config.docs_resolved.dir.clone(),
                config
                    .blog_resolved
                    .enabled
                    .then(|| config.blog_resolved.dir.clone()),
                Arc::clone(&cache),
                tx,
            )
            .with_debounce_ms(config.live_reload.debounce_ms),
        );
        watcher.start();
        // Nothing watchable means no reload events; skip the ws route.
        (watcher.state() == WatcherState::Watching).then_some(watcher)
    } else {
        None
    };

    let state = Arc::new(AppState::new(library, watcher.clone()));
    let app = app::create_router(Arc::clone(&state));

    let addr = SocketAddr::from_str(&format!("{}:{}", config.server.host, config.server.port))?;
    tracing::info!(address = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(watcher) = watcher {
        watcher.stop();
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
