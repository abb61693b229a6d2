//! Mindwell - mental wellness companion service library
//!
//! This library provides the chat pipeline, the mood journal and the HTTP API
//! around them.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `responder`: Keyword classification and canned replies
//! - `completion`: Live completion client with retries and fallback
//! - `storage`: Document store for chat exchanges and journal entries
//! - `chat`: The chat pipeline tying the three together
//! - `journal`: Journal validation, filtering and insights
//! - `sentiment`: Word-list sentiment scoring
//! - `server`: axum router, handlers and error mapping
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use mindwell::{chat::ChatRequest, server::AppState, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut config = Config::load("config/config.yaml", &Default::default())?;
//!     config.storage.database_url = Some("memory:".to_string());
//!     config.validate()?;
//!
//!     let state = AppState::from_config(&config)?;
//!     let reply = state.chat.respond(ChatRequest::new("I feel overwhelmed")).await?;
//!     println!("{}", reply.response);
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod cli;
pub mod commands;
pub mod completion;
pub mod config;
pub mod error;
pub mod journal;
pub mod responder;
pub mod sentiment;
pub mod server;
pub mod storage;

// Re-export commonly used types
pub use chat::{ChatReply, ChatRequest, ChatService};
pub use completion::{CompletionClient, CompletionError, ResponseSource};
pub use config::Config;
pub use error::{MindwellError, Result};
pub use journal::JournalService;
pub use responder::{Category, ResponseSelector};
pub use storage::ConversationStore;
