//! Mindwell - mental wellness companion service
//!
#![doc = "Main entry point for the Mindwell service and CLI."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mindwell::cli::{Cli, Commands};
use mindwell::commands;
use mindwell::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Initialize tracing once the output format is known
    init_tracing(cli.verbose, config.logging.json_format);

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Serve { bind } => {
            tracing::info!("Starting HTTP API");
            commands::serve::run_serve(config, bind).await?;
            Ok(())
        }
        Commands::Ask {
            message,
            user_id,
            no_store,
        } => {
            tracing::debug!("Running single chat message");
            commands::ask::run_ask(config, message, user_id, no_store).await?;
            Ok(())
        }
        Commands::History { user_id, limit } => {
            commands::history::show_history(&config, user_id, limit)?;
            Ok(())
        }
        Commands::Journal { command } => {
            commands::journal::handle_journal(&config, command).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool, json: bool) {
    let default_directive = if verbose { "mindwell=debug" } else { "mindwell=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
