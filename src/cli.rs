//! Command-line interface definition for Mindwell
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands to serve the HTTP API and to use the chat pipeline
//! and journal from a terminal.

use clap::{Parser, Subcommand};

/// Mindwell - mental wellness companion service
///
/// Serves the chat and journal API, or runs single operations against the
/// configured store.
#[derive(Parser, Debug, Clone)]
#[command(name = "mindwell")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the store connection string (`memory:`, `sled://<path>` or a path)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Mindwell
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Override the listen address from config
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Send one message through the chat pipeline and print the reply
    Ask {
        /// Message text
        #[arg(short, long)]
        message: String,

        /// Attribute the exchange to a user
        #[arg(short, long)]
        user_id: Option<String>,

        /// Do not persist the exchange
        #[arg(long)]
        no_store: bool,
    },

    /// Show recent chat exchanges
    History {
        /// Only show exchanges for this user
        #[arg(short, long)]
        user_id: Option<String>,

        /// Maximum number of exchanges to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Manage journal entries
    Journal {
        /// Journal subcommand
        #[command(subcommand)]
        command: JournalCommand,
    },
}

/// Journal subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum JournalCommand {
    /// Record a mood check-in
    Add {
        /// Entry text
        #[arg(short, long)]
        content: String,

        /// Mood from 1 (very low) to 5 (very good)
        #[arg(short, long)]
        mood: i64,

        /// Attribute the entry to a user
        #[arg(short, long)]
        user_id: Option<String>,

        /// Tag label (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// Activity label (repeatable)
        #[arg(short, long = "activity")]
        activities: Vec<String>,
    },

    /// List journal entries, newest first
    List {
        /// Only show entries for this user
        #[arg(short, long)]
        user_id: Option<String>,

        /// Comma separated tags; entries with any of them are shown
        #[arg(short, long)]
        tags: Option<String>,

        /// Maximum number of entries to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            database_url: None,
            command: Commands::Serve { bind: None },
        }
    }
}
