use crate::config::Config;
use crate::error::Result;
use crate::server::{self, AppState};

/// Open the store, wire the services and serve until shutdown
pub async fn run_serve(config: Config, bind: Option<String>) -> Result<()> {
    let bind_address = bind.unwrap_or_else(|| config.server.bind_address.clone());
    let state = AppState::from_config(&config)?;
    tracing::info!(
        live_completion = state.chat.live_completion_enabled(),
        "Services ready"
    );
    server::serve(&bind_address, state).await
}
