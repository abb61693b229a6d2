//! HTTP API
//!
//! [`AppState`] is built once by the composition root from the loaded
//! configuration and shared with every handler through axum state.

pub mod error;
pub mod routes;

use crate::chat::ChatService;
use crate::completion::CompletionClient;
use crate::config::Config;
use crate::error::{MindwellError, Result};
use crate::journal::JournalService;
use crate::storage::{ConversationStore, ListLimits};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub chat: ChatService,
    pub journal: JournalService,
    pub limits: ListLimits,
}

impl AppState {
    pub fn new(chat: ChatService, journal: JournalService, limits: ListLimits) -> Self {
        Self {
            chat,
            journal,
            limits,
        }
    }

    /// Open the store and wire the services described by `config`
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be opened or the completion client
    /// cannot be created
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = ConversationStore::open(&config.storage)?;
        Self::with_store(config, store)
    }

    /// Wire the services around an already opened store
    pub fn with_store(config: &Config, store: ConversationStore) -> Result<Self> {
        let completion = if config.completion.enabled {
            Some(CompletionClient::from_config(&config.completion)?)
        } else {
            tracing::info!("Live completion disabled; replies come from canned responses");
            None
        };

        Ok(Self::new(
            ChatService::new(store.clone(), completion),
            JournalService::new(store),
            ListLimits::from(&config.storage),
        ))
    }
}

/// Build the router with all routes and the tracing layer
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::chat_routes())
        .merge(routes::journal_routes())
        .merge(routes::utility_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serve the API on `bind_address` until a shutdown signal arrives
pub async fn serve(bind_address: &str, state: AppState) -> Result<()> {
    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        MindwellError::Config(format!("Invalid bind address {}: {}", bind_address, e))
    })?;
    let app = router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => tracing::warn!(error = %e, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}
